//! Deterministic envelope file names.
//!
//! An `(actionID, uniqRequestID)` pair maps to exactly one request file and
//! one response file:
//!
//! ```text
//! actionRequest_<actionID:05>_<uniqRequestID:08>.xml
//! actionResponse_<actionID:05>_<uniqRequestID:08>.xml
//! ```

use std::fmt;

use uuid::Uuid;

use crate::envelope::params::split_first_comma;

pub const REQUEST_PREFIX: &str = "actionRequest";
pub const RESPONSE_PREFIX: &str = "actionResponse";
pub const ENVELOPE_SUFFIX: &str = ".xml";

/// Correlation key of a request/response pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub action_id: u32,
    pub request_id: u32,
}

impl ActionKey {
    pub fn new(action_id: u32, request_id: u32) -> Self {
        Self {
            action_id,
            request_id,
        }
    }

    /// Parse the `act` field, `<actionID>,<uniqRequestID>`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (action, request) = split_first_comma(raw);
        let action_id = action.trim().parse().ok()?;
        let request_id = request.trim().parse().ok()?;
        Some(Self::new(action_id, request_id))
    }

    /// Action ID as written into file names and the `actionId` attribute.
    pub fn padded_action_id(&self) -> String {
        format!("{:05}", self.action_id)
    }

    pub fn request_file_name(&self) -> String {
        format!("{}_{}{}", REQUEST_PREFIX, self, ENVELOPE_SUFFIX)
    }

    pub fn response_file_name(&self) -> String {
        format!("{}_{}{}", RESPONSE_PREFIX, self, ENVELOPE_SUFFIX)
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}_{:08}", self.action_id, self.request_id)
    }
}

/// Hidden staging name for `name`; never matches an envelope pattern.
pub fn staging_name(name: &str) -> String {
    format!(".{}.tmp.{}", name, Uuid::new_v4())
}

/// Hidden name a response is moved to while one reader owns it.
pub fn claim_name(name: &str) -> String {
    format!(".{}.claim.{}", name, Uuid::new_v4())
}
