//! Payload of the `REGISTER` system intent: a device describing itself and
//! the commands and notifications it understands.

use std::sync::LazyLock;

use uuid::Uuid;

use crate::codec::BinaryStruct;
use crate::data_type::DataType;
use crate::error::Result;
use crate::factory::{CommandMetadata, ParameterMetadata};
use crate::schema::Schema;
use crate::value::Value;

/// A parameter as it appears on the wire: data type code and name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredParameter {
    pub type_code: u8,
    pub name: String,
}

/// A command or notification declared by a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub intent: u16,
    pub name: String,
    pub parameters: Vec<RegisteredParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentInfo {
    pub name: String,
    pub code: String,
    pub equipment_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistration {
    pub device_id: Uuid,
    pub key: String,
    pub name: String,
    pub class_name: String,
    pub class_version: String,
    pub equipment: Vec<EquipmentInfo>,
    pub notifications: Vec<RegisteredCommand>,
    pub commands: Vec<RegisteredCommand>,
}

impl RegisteredCommand {
    /// Resolve parameter type codes. Unknown or non-scalar codes fail with
    /// `UnsupportedDataType`.
    pub fn to_metadata(&self) -> Result<CommandMetadata> {
        let parameters = self
            .parameters
            .iter()
            .map(|param| {
                Ok(ParameterMetadata::new(
                    DataType::from_code(param.type_code)?,
                    param.name.as_str(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CommandMetadata::new(self.intent, self.name.as_str(), parameters))
    }
}

impl From<&CommandMetadata> for RegisteredCommand {
    fn from(metadata: &CommandMetadata) -> Self {
        Self {
            intent: metadata.intent,
            name: metadata.name.clone(),
            parameters: metadata
                .parameters
                .iter()
                .map(|param| RegisteredParameter {
                    type_code: param.data_type.code(),
                    name: param.name.clone(),
                })
                .collect(),
        }
    }
}

impl DeviceRegistration {
    pub fn commands(&self) -> Result<Vec<CommandMetadata>> {
        self.commands.iter().map(RegisteredCommand::to_metadata).collect()
    }

    pub fn notifications(&self) -> Result<Vec<CommandMetadata>> {
        self.notifications
            .iter()
            .map(RegisteredCommand::to_metadata)
            .collect()
    }
}

fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

impl BinaryStruct for RegisteredParameter {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<RegisteredParameter>> = LazyLock::new(|| {
            Schema::<RegisteredParameter>::new("parameter")
                .scalar(
                    "type",
                    DataType::Byte,
                    |p| Value::Byte(p.type_code),
                    |p, v| {
                        p.type_code = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "name",
                    DataType::String,
                    |p| string(&p.name),
                    |p, v| {
                        p.name = v.try_into()?;
                        Ok(())
                    },
                )
        });
        &SCHEMA
    }
}

impl BinaryStruct for RegisteredCommand {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<RegisteredCommand>> = LazyLock::new(|| {
            Schema::<RegisteredCommand>::new("command")
                .scalar(
                    "intent",
                    DataType::Word,
                    |c| Value::Word(c.intent),
                    |c, v| {
                        c.intent = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "name",
                    DataType::String,
                    |c| string(&c.name),
                    |c, v| {
                        c.name = v.try_into()?;
                        Ok(())
                    },
                )
                .array::<RegisteredParameter>(
                    "parameters",
                    |c| c.parameters.as_slice(),
                    |c, items| c.parameters = items,
                )
        });
        &SCHEMA
    }
}

impl BinaryStruct for EquipmentInfo {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<EquipmentInfo>> = LazyLock::new(|| {
            Schema::<EquipmentInfo>::new("equipment")
                .scalar(
                    "name",
                    DataType::String,
                    |e| string(&e.name),
                    |e, v| {
                        e.name = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "code",
                    DataType::String,
                    |e| string(&e.code),
                    |e, v| {
                        e.code = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "type",
                    DataType::String,
                    |e| string(&e.equipment_type),
                    |e, v| {
                        e.equipment_type = v.try_into()?;
                        Ok(())
                    },
                )
        });
        &SCHEMA
    }
}

impl BinaryStruct for DeviceRegistration {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<DeviceRegistration>> = LazyLock::new(|| {
            Schema::<DeviceRegistration>::new("registration")
                .scalar(
                    "id",
                    DataType::Guid,
                    |r| Value::Guid(r.device_id),
                    |r, v| {
                        r.device_id = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "key",
                    DataType::String,
                    |r| string(&r.key),
                    |r, v| {
                        r.key = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "name",
                    DataType::String,
                    |r| string(&r.name),
                    |r, v| {
                        r.name = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "device_class_name",
                    DataType::String,
                    |r| string(&r.class_name),
                    |r, v| {
                        r.class_name = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "device_class_version",
                    DataType::String,
                    |r| string(&r.class_version),
                    |r, v| {
                        r.class_version = v.try_into()?;
                        Ok(())
                    },
                )
                .array::<EquipmentInfo>(
                    "equipment",
                    |r| r.equipment.as_slice(),
                    |r, items| r.equipment = items,
                )
                .array::<RegisteredCommand>(
                    "notifications",
                    |r| r.notifications.as_slice(),
                    |r, items| r.notifications = items,
                )
                .array::<RegisteredCommand>(
                    "commands",
                    |r| r.commands.as_slice(),
                    |r, items| r.commands = items,
                )
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructError;

    fn registration() -> DeviceRegistration {
        let led = CommandMetadata::new(
            257,
            "UpdateLedState",
            vec![
                ParameterMetadata::new(DataType::String, "equipment"),
                ParameterMetadata::new(DataType::Byte, "state"),
            ],
        );
        let button = CommandMetadata::new(
            256,
            "equipment",
            vec![ParameterMetadata::new(DataType::Boolean, "pressed")],
        );

        DeviceRegistration {
            device_id: Uuid::parse_str("fa8a9d6e-6555-11e2-89b8-e0cb4eb92129").unwrap(),
            key: "secret".into(),
            name: "board".into(),
            class_name: "sample".into(),
            class_version: "1.0".into(),
            equipment: vec![EquipmentInfo {
                name: "LED".into(),
                code: "led".into(),
                equipment_type: "controllable".into(),
            }],
            notifications: vec![RegisteredCommand::from(&button)],
            commands: vec![RegisteredCommand::from(&led)],
        }
    }

    #[test]
    fn registration_roundtrips_with_nested_arrays() {
        let original = registration();
        let wire = original.to_binary().unwrap();
        let decoded = DeviceRegistration::from_binary(&wire).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn wire_layout_starts_with_id_and_key() {
        let wire = registration().to_binary().unwrap();
        assert_eq!(&wire[..4], &[0xfa, 0x8a, 0x9d, 0x6e]);
        assert_eq!(&wire[16..18], &[0x06, 0x00]);
        assert_eq!(&wire[18..24], b"secret");
    }

    #[test]
    fn parameter_wire_layout() {
        let param = RegisteredParameter {
            type_code: DataType::Word.code(),
            name: "x".into(),
        };
        assert_eq!(param.to_binary().unwrap().as_ref(), &[0x02, 0x01, 0x00, b'x']);
    }

    #[test]
    fn commands_resolve_type_codes() {
        let commands = registration().commands().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].intent, 257);
        assert_eq!(commands[0].parameters[1].data_type, DataType::Byte);

        let notifications = registration().notifications().unwrap();
        assert_eq!(notifications[0].parameters[0].data_type, DataType::Boolean);
    }

    #[test]
    fn unsupported_type_code_is_reported() {
        let mut reg = registration();
        reg.commands[0].parameters[0].type_code = 15;
        assert!(matches!(
            reg.commands(),
            Err(StructError::UnsupportedDataType(ref name)) if name == "array"
        ));
    }
}
