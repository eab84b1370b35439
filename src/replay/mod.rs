//! Replay of captured texture-call scripts.
//!
//! A capture interceptor sitting between an application and its driver
//! appends one textual command per observed call:
//!
//! ```text
//! playback.create_texture(7);
//! playback.mip_upload(7, 0, 132, 37);
//! playback.update_mip(7, 0, 16, 16, 8, 8)
//! playback.delete_texture(7);
//! playback.swap();
//! ```
//!
//! `create_texture` appears exactly once per id before that id's first
//! upload. The capture logger omits the terminator after `update_mip`, so a
//! line may carry several concatenated commands; the parser handles that.

mod player;

pub use player::Playback;

use crate::error::ReplayError;

/// One captured backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayCommand {
    /// Allocate a texture under an externally supplied id.
    CreateTexture { id: u64 },
    /// Upload one full mip level.
    MipUpload {
        id: u64,
        level: u32,
        width: u32,
        height: u32,
    },
    /// Rewrite a sub-region of an existing mip level.
    UpdateMip {
        id: u64,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Release a texture.
    DeleteTexture { id: u64 },
    /// Draw every live texture.
    Draw,
    /// Frame boundary.
    Swap,
}

/// Parse a whole capture script.
///
/// Blank lines and `//` comments are skipped; the `playback.` prefix and
/// trailing `;` are optional. Errors carry the 1-based line number.
pub fn parse_script(input: &str) -> Result<Vec<ReplayCommand>, ReplayError> {
    let mut commands = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let mut rest = line.trim();
        while !rest.is_empty() && !rest.starts_with("//") {
            let (command, remainder) = parse_command(rest, line_no)?;
            commands.push(command);
            rest = remainder.trim_start_matches(';').trim_start();
        }
    }
    Ok(commands)
}

fn parse_error(line: usize, message: impl Into<String>) -> ReplayError {
    ReplayError::Parse {
        line,
        message: message.into(),
    }
}

/// Parse one `name(args)` call, returning the unconsumed remainder.
fn parse_command(input: &str, line: usize) -> Result<(ReplayCommand, &str), ReplayError> {
    let open = input
        .find('(')
        .ok_or_else(|| parse_error(line, format!("expected a command call, got {input:?}")))?;
    let close = input[open..]
        .find(')')
        .map(|offset| open + offset)
        .ok_or_else(|| parse_error(line, "unterminated argument list"))?;

    let name = input[..open].trim();
    let name = name.strip_prefix("playback.").unwrap_or(name);

    let args_text = input[open + 1..close].trim();
    let mut args = Vec::new();
    if !args_text.is_empty() {
        for piece in args_text.split(',') {
            let value: u64 = piece
                .trim()
                .parse()
                .map_err(|_| parse_error(line, format!("bad argument {:?}", piece.trim())))?;
            args.push(value);
        }
    }

    let expect = |count: usize| {
        if args.len() == count {
            Ok(())
        } else {
            Err(parse_error(
                line,
                format!("{name} takes {count} arguments, got {}", args.len()),
            ))
        }
    };
    let dim = |value: u64| -> Result<u32, ReplayError> {
        u32::try_from(value).map_err(|_| parse_error(line, format!("argument {value} out of range")))
    };

    let command = match name {
        "create_texture" => {
            expect(1)?;
            ReplayCommand::CreateTexture { id: args[0] }
        }
        "mip_upload" => {
            expect(4)?;
            ReplayCommand::MipUpload {
                id: args[0],
                level: dim(args[1])?,
                width: dim(args[2])?,
                height: dim(args[3])?,
            }
        }
        "update_mip" => {
            expect(6)?;
            ReplayCommand::UpdateMip {
                id: args[0],
                level: dim(args[1])?,
                x: dim(args[2])?,
                y: dim(args[3])?,
                width: dim(args[4])?,
                height: dim(args[5])?,
            }
        }
        "delete_texture" => {
            expect(1)?;
            ReplayCommand::DeleteTexture { id: args[0] }
        }
        "draw" => {
            expect(0)?;
            ReplayCommand::Draw
        }
        "swap" => {
            expect(0)?;
            ReplayCommand::Swap
        }
        other => return Err(parse_error(line, format!("unknown command {other:?}"))),
    };

    Ok((command, &input[close + 1..]))
}
