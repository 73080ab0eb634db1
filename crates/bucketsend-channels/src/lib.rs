//! # BucketSend Channels
//! Outbound HTTP collaborators: the Twilio SMS provider and the
//! marketing-copy generation service.

pub mod copygen;
pub mod sms;

pub use copygen::{CopyGenClient, TemplateGenerator};
pub use sms::TwilioSender;
