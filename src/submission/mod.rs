//! Submission storage: respondent value maps, file attachments, and the
//! pre-upload staging area for files uploaded before their submission
//! exists.

pub mod store;
pub mod temp;
pub mod types;

pub use store::SubmissionStore;
pub use types::{
    BulkDeleteReport, FileAttachment, FileClaim, Submission, SubmissionDetail, SubmissionFilter,
    SubmissionPage, SubmissionStatus, TempUpload,
};
