//! Meeting domain types.
//!
//! A meeting is one user's intent to record one calendar occurrence. Its
//! status follows the recording bot through the provider's lifecycle.

pub mod link;
pub mod status;

pub use link::{find_meeting_info, MeetingInfo, Platform};
pub use status::MeetingStatus;
