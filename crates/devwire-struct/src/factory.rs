//! Runtime message types synthesized from device-supplied command metadata.
//!
//! A generated [`MessageType`] is plain data: an ordered [`Schema`] over
//! [`DynamicMessage`], whose fields are named slots. No nominal Rust type is
//! minted per command.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::codec::StructCodec;
use crate::data_type::DataType;
use crate::error::{Result, StructError};
use crate::field::{FieldAccessor, ScalarField};
use crate::schema::Schema;
use crate::value::Value;

/// One typed, named command or notification parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub name: String,
}

impl ParameterMetadata {
    pub fn new(data_type: DataType, name: impl Into<String>) -> Self {
        Self {
            data_type,
            name: name.into(),
        }
    }
}

/// Intent, name and ordered parameters of a device-defined message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    pub intent: u16,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterMetadata>,
}

impl CommandMetadata {
    pub fn new(intent: u16, name: impl Into<String>, parameters: Vec<ParameterMetadata>) -> Self {
        Self {
            intent,
            name: name.into(),
            parameters,
        }
    }
}

/// Attribute bag backing instances of a generated message type.
///
/// Slots keep declaration order and start at their data type's zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    type_name: Arc<str>,
    slots: Vec<(String, Value)>,
}

impl DynamicMessage {
    fn new(type_name: Arc<str>, parameters: &[ParameterMetadata]) -> Self {
        let slots = parameters
            .iter()
            .map(|param| (param.name.clone(), param.data_type.default_value()))
            .collect();
        Self { type_name, slots }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slot(name).map(|index| &self.slots[index].1)
    }

    /// Store `value` in the named slot. The value is kept as given; its
    /// variant is checked against the field type only when serializing.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.slot(name).ok_or_else(|| self.unknown(name))?;
        self.slots[index].1 = value.into();
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    /// Slots in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.slots.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn to_json(&self) -> Json {
        let map: Map<String, Json> = self
            .slots
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Json::Object(map)
    }

    fn slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|(slot, _)| slot == name)
    }

    fn unknown(&self, name: &str) -> StructError {
        StructError::UnknownAttribute {
            message_type: self.type_name.to_string(),
            name: name.to_string(),
        }
    }
}

/// Bulk-assign named values on a generated message.
///
/// Every key is checked before anything is assigned, so a rejected call leaves
/// the message untouched.
pub fn apply_values<I, K, V>(message: &mut DynamicMessage, values: I) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    let values: Vec<(K, V)> = values.into_iter().collect();
    if let Some((name, _)) = values.iter().find(|(name, _)| !message.contains(name.as_ref())) {
        return Err(message.unknown(name.as_ref()));
    }
    for (name, value) in values {
        message.set(name.as_ref(), value)?;
    }
    Ok(())
}

/// Reads and writes one named slot of a [`DynamicMessage`].
#[derive(Debug, Clone)]
pub struct SlotAccessor {
    name: String,
}

impl SlotAccessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl FieldAccessor<DynamicMessage> for SlotAccessor {
    fn get(&self, target: &DynamicMessage) -> Result<Value> {
        target
            .get(&self.name)
            .cloned()
            .ok_or_else(|| target.unknown(&self.name))
    }

    fn set(&self, target: &mut DynamicMessage, value: Value) -> Result<()> {
        target.set(&self.name, value)
    }
}

/// A message shape generated from [`CommandMetadata`].
pub struct MessageType {
    intent: u16,
    name: Arc<str>,
    parameters: Arc<[ParameterMetadata]>,
    schema: Schema<DynamicMessage>,
}

impl MessageType {
    pub fn intent(&self) -> u16 {
        self.intent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParameterMetadata] {
        &self.parameters
    }

    pub fn schema(&self) -> &Schema<DynamicMessage> {
        &self.schema
    }

    pub fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new(self.intent, self.name.as_ref(), self.parameters.to_vec())
    }

    /// Fresh message with every slot at its zero value.
    pub fn instantiate(&self) -> DynamicMessage {
        self.schema.instantiate()
    }

    pub fn serialize(&self, message: &DynamicMessage) -> Result<Bytes> {
        StructCodec::serialize(&self.schema, message)
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<DynamicMessage> {
        StructCodec::deserialize(&self.schema, bytes)
    }

    /// Build a message from a JSON object keyed by parameter name. Missing
    /// parameters keep their zero value.
    pub fn message_from_json(&self, json: &Json) -> Result<DynamicMessage> {
        let object = json.as_object().ok_or_else(|| {
            StructError::InvalidMetadata(format!("values for `{}` must be a JSON object", self.name))
        })?;

        let mut message = self.instantiate();
        let mut values = Vec::with_capacity(object.len());
        for (key, raw) in object {
            let param = self
                .parameters
                .iter()
                .find(|param| &param.name == key)
                .ok_or_else(|| message.unknown(key))?;
            values.push((key.as_str(), Value::from_json(param.data_type, key, raw)?));
        }
        apply_values(&mut message, values)?;
        Ok(message)
    }
}

impl std::fmt::Debug for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageType")
            .field("intent", &self.intent)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Synthesizes [`MessageType`]s from command metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaFactory;

impl SchemaFactory {
    pub fn new() -> Self {
        Self
    }

    /// One slot-backed scalar field per parameter, in declaration order.
    pub fn generate(&self, metadata: &CommandMetadata) -> Result<MessageType> {
        let mut seen = HashSet::with_capacity(metadata.parameters.len());
        for param in &metadata.parameters {
            if !seen.insert(param.name.as_str()) {
                return Err(StructError::DuplicateField {
                    message_type: metadata.name.clone(),
                    field: param.name.clone(),
                });
            }
        }

        let name: Arc<str> = Arc::from(metadata.name.as_str());
        let parameters: Arc<[ParameterMetadata]> = Arc::from(metadata.parameters.as_slice());

        let init_name = Arc::clone(&name);
        let init_parameters = Arc::clone(&parameters);
        let mut schema = Schema::with_init(metadata.name.as_str(), move || {
            DynamicMessage::new(Arc::clone(&init_name), &init_parameters)
        });
        for param in parameters.iter() {
            schema = schema.field(ScalarField::new(
                param.name.as_str(),
                param.data_type,
                SlotAccessor::new(param.name.as_str()),
            ));
        }

        debug!(
            intent = metadata.intent,
            name = %metadata.name,
            fields = parameters.len(),
            "generated message type"
        );

        Ok(MessageType {
            intent: metadata.intent,
            name,
            parameters,
            schema,
        })
    }
}
