use devwire_frame::Packet;
use devwire_struct::StructError;

use crate::cmd::{load_registry, EncodeArgs};
use crate::exit::{packet_error, struct_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let packet =
        Packet::with_default_signature(args.packet_version, args.flags, args.intent, payload)
            .map_err(|err| packet_error("encode failed", err))?;
    print_encoded(&packet, format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(text) = &args.hex {
        return parse_hex(text);
    }
    if let Some(json) = &args.json {
        let registry = load_registry(args.commands.as_deref())?;
        let message_type = registry
            .get(args.intent)
            .ok_or_else(|| struct_error("encode failed", StructError::NoSchema(args.intent)))?;
        let values: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        let message = message_type
            .message_from_json(&values)
            .map_err(|err| struct_error("encode failed", err))?;
        let payload = message_type
            .serialize(&message)
            .map_err(|err| struct_error("encode failed", err))?;
        return Ok(payload.to_vec());
    }
    Ok(Vec::new())
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.split_whitespace().collect();
    hex::decode(&compact).map_err(|err| CliError::new(USAGE, format!("--hex is not valid hex: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_ignores_whitespace() {
        assert_eq!(parse_hex("31 32\n33").unwrap(), b"123".to_vec());
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn parse_hex_rejects_invalid_digits() {
        let err = parse_hex("zz").unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(parse_hex("abc").is_err());
    }
}
