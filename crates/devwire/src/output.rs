use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use devwire_frame::{intent_name, Packet};
use devwire_struct::{DynamicMessage, MessageType};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    intent: u16,
    intent_name: &'a str,
    version: u8,
    flags: u8,
    length: u16,
    checksum: String,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<serde_json::Value>,
}

/// Display name for an intent: the registered message type if any, else the
/// system intent name.
pub fn display_name<'a>(intent: u16, message_type: Option<&'a MessageType>) -> &'a str {
    message_type.map_or_else(|| intent_name(intent), MessageType::name)
}

pub fn print_packet(
    packet: &Packet,
    message_type: Option<&MessageType>,
    decoded: Option<&DynamicMessage>,
    format: OutputFormat,
) {
    let name = display_name(packet.intent(), message_type);
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                intent: packet.intent(),
                intent_name: name,
                version: packet.version(),
                flags: packet.flags(),
                length: packet.length(),
                checksum: format!("{:02x}", packet.checksum()),
                payload: hex::encode(packet.data()),
                fields: decoded.map(DynamicMessage::to_json),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INTENT", "NAME", "VER", "FLAGS", "LEN", "PAYLOAD"])
                .add_row(vec![
                    packet.intent().to_string(),
                    name.to_string(),
                    packet.version().to_string(),
                    packet.flags().to_string(),
                    packet.length().to_string(),
                    hex::encode(packet.data()),
                ]);
            if let Some(message) = decoded {
                for (field, value) in message.fields() {
                    table.add_row(vec![
                        String::new(),
                        field.to_string(),
                        String::new(),
                        String::new(),
                        String::new(),
                        value.to_string(),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "intent={} ({}) version={} flags={} length={} payload={}",
                packet.intent(),
                name,
                packet.version(),
                packet.flags(),
                packet.length(),
                hex::encode(packet.data())
            );
            if let Some(message) = decoded {
                for (field, value) in message.fields() {
                    println!("  {field} = {value}");
                }
            }
        }
        OutputFormat::Raw => {
            print_raw(packet.data());
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput {
    intent: u16,
    length: u16,
    checksum: String,
    frame: String,
}

pub fn print_encoded(packet: &Packet, format: OutputFormat) {
    let wire = packet.to_binary();
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                intent: packet.intent(),
                length: packet.length(),
                checksum: format!("{:02x}", packet.checksum()),
                frame: hex::encode(&wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{}", hex::encode(&wire));
        }
        OutputFormat::Raw => print_raw(&wire),
    }
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    intent: u16,
    name: &'a str,
    parameters: Vec<ParameterOutput<'a>>,
}

#[derive(Serialize)]
struct ParameterOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    data_type: &'static str,
}

pub fn print_commands(types: &[&MessageType], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<CommandOutput<'_>> = types
                .iter()
                .map(|message_type| CommandOutput {
                    intent: message_type.intent(),
                    name: message_type.name(),
                    parameters: message_type
                        .parameters()
                        .iter()
                        .map(|param| ParameterOutput {
                            name: &param.name,
                            data_type: param.data_type.as_str(),
                        })
                        .collect(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INTENT", "NAME", "PARAMETERS"]);
            for message_type in types {
                table.add_row(vec![
                    message_type.intent().to_string(),
                    message_type.name().to_string(),
                    parameter_summary(message_type),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for message_type in types {
                println!(
                    "{} {}({})",
                    message_type.intent(),
                    message_type.name(),
                    parameter_summary(message_type)
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn parameter_summary(message_type: &MessageType) -> String {
    message_type
        .parameters()
        .iter()
        .map(|param| format!("{}: {}", param.name, param.data_type))
        .collect::<Vec<_>>()
        .join(", ")
}
