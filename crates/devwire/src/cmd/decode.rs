use std::fs::File;
use std::io::{self, Read};

use devwire_frame::{FrameConfig, Packet, PacketError, PacketReader, REGISTER};
use devwire_struct::{
    BinaryStruct, CommandRegistry, DeviceRegistration, DynamicMessage, MessageType,
};
use tracing::{info, warn};

use crate::cmd::{load_registry, DecodeArgs};
use crate::exit::{io_error, packet_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut registry = load_registry(args.commands.as_deref())?;

    let input: Box<dyn Read> = match &args.input {
        Some(path) if path.as_os_str() != "-" => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?,
        ),
        _ => Box::new(io::stdin().lock()),
    };

    let config = FrameConfig {
        max_payload_size: usize::from(args.max_payload),
        ..FrameConfig::default()
    };
    let mut reader = PacketReader::with_config(input, config);
    let mut decoded_packets = 0usize;

    loop {
        if args.count.is_some_and(|limit| decoded_packets >= limit) {
            break;
        }

        let packet = match reader.read_packet() {
            Ok(packet) => packet,
            Err(PacketError::ConnectionClosed) => break,
            Err(err) => return Err(packet_error("read failed", err)),
        };

        if packet.intent() == REGISTER {
            learn_registration(&mut registry, &packet);
        }

        let message_type = registry.get(packet.intent());
        let decoded = message_type.and_then(|message_type| decode_fields(message_type, &packet));
        print_packet(&packet, message_type, decoded.as_ref(), format);
        decoded_packets += 1;
    }

    let stats = reader.stats();
    info!(
        packets = stats.packets,
        checksum_failures = stats.checksum_failures,
        oversized_frames = stats.oversized_frames,
        truncated_frames = stats.truncated_frames,
        "decode finished"
    );
    Ok(SUCCESS)
}

fn decode_fields(
    message_type: &MessageType,
    packet: &Packet,
) -> Option<DynamicMessage> {
    match message_type.deserialize(packet.data()) {
        Ok(message) => Some(message),
        Err(err) => {
            warn!(
                intent = packet.intent(),
                message_type = message_type.name(),
                error = %err,
                "payload does not match registered message type"
            );
            None
        }
    }
}

/// A device registration declares the message types used by later packets.
fn learn_registration(registry: &mut CommandRegistry, packet: &Packet) {
    let result = DeviceRegistration::from_binary(packet.data())
        .and_then(|registration| registry.register_device(&registration).map(|()| registration));
    match result {
        Ok(registration) => info!(
            device = %registration.device_id,
            name = %registration.name,
            commands = registration.commands.len(),
            notifications = registration.notifications.len(),
            "learned device registration"
        ),
        Err(err) => warn!(error = %err, "ignoring malformed device registration"),
    }
}
