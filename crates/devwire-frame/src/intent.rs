//! Built-in intent IDs.
//!
//! Intents 0-255 are reserved for system messages.
//! Intents 256-65535 are available for device-defined commands and notifications.

/// Gateway asks the device to send its registration.
pub const REQUEST_REGISTRATION: u16 = 0;

/// Device registration with a binary payload.
pub const REGISTER: u16 = 1;

/// Device reports the result of a command.
pub const COMMAND_RESULT: u16 = 2;

/// Device registration with a JSON payload.
pub const REGISTER_JSON: u16 = 3;

/// First device-defined intent ID.
pub const USER_INTENT_START: u16 = 256;

/// Returns a human-readable name for an intent ID.
pub fn intent_name(id: u16) -> &'static str {
    match id {
        REQUEST_REGISTRATION => "REQUEST_REGISTRATION",
        REGISTER => "REGISTER",
        COMMAND_RESULT => "COMMAND_RESULT",
        REGISTER_JSON => "REGISTER_JSON",
        4..=255 => "RESERVED",
        _ => "USER",
    }
}

/// Returns true if the intent ID is in the reserved range.
pub fn is_reserved(id: u16) -> bool {
    id < USER_INTENT_START
}

/// Returns true if the intent ID is a defined system intent.
pub fn is_system(id: u16) -> bool {
    id <= REGISTER_JSON
}
