mod content;
mod policy;
mod published;
mod schedule;
mod slot;
mod workspace;

pub use content::{
    ContentStatus, Draft, FormattedVariant, FormattedVariants, NewDraft, NewPostDraft, PostDraft,
};
pub use policy::{SchedulingPolicy, TimeOfDay, TimeWindow, parse_timezone};
pub use published::{NewPublishedPost, PublishedPost};
pub use schedule::{ContentRef, NewSchedule, Schedule, ScheduleStatus};
pub use slot::{NewSchedulingSlot, SchedulingSlot};
pub use workspace::{
    NewPlatformCredential, NewWorkspace, PlatformCredential, PublishCredentials, Workspace,
};
