use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use devwire_frame::Packet;
use serde_json::Value as Json;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, StructError};
use crate::factory::{CommandMetadata, DynamicMessage, MessageType, SchemaFactory};
use crate::registration::DeviceRegistration;

const METADATA_SUFFIX: &str = ".command.json";

/// Intent-keyed registry of generated message types.
pub struct CommandRegistry {
    types: HashMap<u16, MessageType>,
    factory: SchemaFactory,
    config: RegistryConfig,
}

impl CommandRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            types: HashMap::new(),
            factory: SchemaFactory::new(),
            config,
        }
    }

    /// Generate and register the message type for `metadata`.
    pub fn register(&mut self, metadata: &CommandMetadata) -> Result<()> {
        self.register_all(std::slice::from_ref(metadata))
    }

    /// Register metadata from JSON: a single command object or an array of them.
    ///
    /// Nothing is registered unless every command in the document is valid.
    pub fn register_json(&mut self, metadata_json: &str) -> Result<()> {
        let json: Json = serde_json::from_str(metadata_json)?;
        let commands: Vec<CommandMetadata> = match json {
            Json::Array(_) => serde_json::from_value(json)?,
            Json::Object(_) => vec![serde_json::from_value(json)?],
            _ => {
                return Err(StructError::InvalidMetadata(
                    "expected a command object or an array of commands".to_string(),
                ))
            }
        };
        self.register_all(&commands)
    }

    /// Register every command and notification a device declared, or none of them.
    pub fn register_device(&mut self, registration: &DeviceRegistration) -> Result<()> {
        let mut declared = registration.commands()?;
        declared.extend(registration.notifications()?);
        self.register_all(&declared)?;
        debug!(
            device = %registration.device_id,
            commands = registration.commands.len(),
            notifications = registration.notifications.len(),
            "registered device message types"
        );
        Ok(())
    }

    fn register_all(&mut self, commands: &[CommandMetadata]) -> Result<()> {
        let mut generated: Vec<MessageType> = Vec::with_capacity(commands.len());
        for metadata in commands {
            let taken = self.types.contains_key(&metadata.intent)
                || generated.iter().any(|pending| pending.intent() == metadata.intent);
            if taken && !self.config.replace_existing {
                return Err(StructError::DuplicateIntent(metadata.intent));
            }
            generated.push(self.factory.generate(metadata)?);
        }

        for message_type in generated {
            let intent = message_type.intent();
            if let Some(previous) = self.types.insert(intent, message_type) {
                debug!(intent, previous = previous.name(), "replaced message type");
            }
        }
        Ok(())
    }

    /// Load metadata files from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load `*.command.json` files from a directory with explicit config.
    ///
    /// Files are applied in name order. Symlinked metadata files are refused.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for file in metadata_files(path, config.max_files_from_directory)? {
            let document = read_metadata(&file, config.max_file_size)?;
            registry.register_json(&document).map_err(|err| match err {
                StructError::Json(err) => {
                    StructError::LoadFailed(format!("{}: {err}", file.display()))
                }
                other => other,
            })?;
            debug!(file = %file.display(), "loaded command metadata");
        }
        Ok(registry)
    }

    /// Load from embedded metadata JSON strings.
    pub fn from_embedded(documents: &[&str]) -> Result<Self> {
        let mut registry = Self::new();
        for document in documents {
            registry.register_json(document)?;
        }
        Ok(registry)
    }

    pub fn get(&self, intent: u16) -> Option<&MessageType> {
        self.types.get(&intent)
    }

    /// Check if an intent has a registered message type.
    pub fn has_type(&self, intent: u16) -> bool {
        self.types.contains_key(&intent)
    }

    /// Registered intents in ascending order.
    pub fn intents(&self) -> Vec<u16> {
        let mut intents: Vec<u16> = self.types.keys().copied().collect();
        intents.sort_unstable();
        intents
    }

    /// Decode a packet payload with the message type registered for `intent`.
    pub fn decode(&self, intent: u16, payload: &[u8]) -> Result<DynamicMessage> {
        self.types
            .get(&intent)
            .ok_or(StructError::NoSchema(intent))?
            .deserialize(payload)
    }

    /// Decode a packet's payload with the message type registered for its intent.
    pub fn decode_packet(&self, packet: &Packet) -> Result<DynamicMessage> {
        self.decode(packet.intent(), packet.data())
    }

    /// Encode a message with the type registered for `intent`.
    pub fn encode(&self, intent: u16, message: &DynamicMessage) -> Result<Bytes> {
        self.types
            .get(&intent)
            .ok_or(StructError::NoSchema(intent))?
            .serialize(message)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Regular `*.command.json` files in `dir`, sorted by name.
fn metadata_files(dir: &Path, limit: usize) -> Result<Vec<PathBuf>> {
    let load_failed =
        |err: std::io::Error| StructError::LoadFailed(format!("{}: {err}", dir.display()));

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(load_failed)? {
        let entry = entry.map_err(load_failed)?;
        let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
        if !name.ends_with(METADATA_SUFFIX) {
            continue;
        }

        // DirEntry::file_type does not follow links.
        let file_type = entry.file_type().map_err(load_failed)?;
        if file_type.is_symlink() {
            return Err(StructError::LoadFailed(format!(
                "refusing symlinked command metadata: {}",
                entry.path().display()
            )));
        }
        if file_type.is_file() {
            files.push(entry.path());
        }
    }

    if files.len() > limit {
        return Err(StructError::LoadFailed(format!(
            "{} holds {} command metadata files, limit is {limit}",
            dir.display(),
            files.len()
        )));
    }
    files.sort();
    Ok(files)
}

fn read_metadata(path: &Path, max_size: usize) -> Result<String> {
    let load_failed =
        |err: std::io::Error| StructError::LoadFailed(format!("{}: {err}", path.display()));

    let file = File::open(path).map_err(load_failed)?;
    let read_limit = u64::try_from(max_size).unwrap_or(u64::MAX).saturating_add(1);
    let mut document = String::new();
    file.take(read_limit)
        .read_to_string(&mut document)
        .map_err(load_failed)?;
    if document.len() > max_size {
        return Err(StructError::LoadFailed(format!(
            "{} exceeds {max_size} bytes",
            path.display()
        )));
    }
    Ok(document)
}
