//! Version command implementation

use chrono::{DateTime, SecondsFormat, Utc};

use crate::cli::{VersionArgs, VersionSubcommand};
use crate::cli::version::{DecodeArgs, EncodeArgs};
use crate::codec::{self, BuildVersion, CompactVersion};
use crate::error::Result;

/// Run version command
pub fn run(args: VersionArgs) -> Result<()> {
    match args.command {
        VersionSubcommand::Encode(encode) => {
            println!("{}", encode_string(&encode)?);
        }
        VersionSubcommand::Decode(decode) => {
            println!("{}", decode_string(&decode)?.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }
    Ok(())
}

/// Encode per the arguments, formatted for output
pub fn encode_string(args: &EncodeArgs) -> Result<String> {
    encode_parts(args.build, args.major, args.at, args.three_field)
}

/// Shared with `manifest set-version --build`
pub fn encode_parts(
    build: i32,
    major: Option<i32>,
    at: Option<DateTime<Utc>>,
    three_field: bool,
) -> Result<String> {
    let at = at.unwrap_or_else(Utc::now);
    let span = tracing::debug_span!("encode", component = "codec", operation = "encode", %at);
    let _enter = span.enter();

    if three_field {
        Ok(codec::encode_compact(build, at)?.to_string())
    } else {
        Ok(codec::encode(build, major.unwrap_or(0), at)?.to_string())
    }
}

fn decode_string(args: &DecodeArgs) -> Result<DateTime<Utc>> {
    let span = tracing::debug_span!("decode", component = "codec", operation = "decode", version = %args.version);
    let _enter = span.enter();

    if args.three_field {
        let version: CompactVersion = args.version.parse()?;
        codec::decode_compact(&version)
    } else {
        let version: BuildVersion = args.version.parse()?;
        codec::decode(&version)
    }
}
