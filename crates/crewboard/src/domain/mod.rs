//! Typed mirrors of the marketplace backend resources.

pub mod applications;
pub mod jobs;
pub mod messaging;
pub mod page;
pub mod workers;

pub use applications::{Application, ApplicationId, ApplicationStatus};
pub use jobs::{Job, JobFilters, JobId, JobRole, JobStatus, JobType, PaymentType};
pub use messaging::{
    Conversation, ConversationId, Message, MessageId, OtherParty, Sender, UnreadCount,
};
pub use page::{Ack, Page};
pub use workers::{AccountKind, UserId, WorkerFilters, WorkerProfile};
