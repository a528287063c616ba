pub mod archive;
pub mod config;
pub mod drive;
pub mod error;
pub mod export;
pub mod media;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod session;
pub mod view;

pub use archive::{load_archive, load_archive_file, load_entries, LoadedTrace};
pub use config::TaskscopeConfig;
pub use drive::{extract_folder_id, load_folder, ArchiveSource, DriveClient, RemoteFile};
pub use error::{ArchiveError, TaskscopeError};
pub use media::{Asset, ImageIndex, Kind};
pub use models::{Step, TraceDocument};
pub use normalize::normalize;
pub use resolver::{resolve_step_images, StepImageSet};
pub use session::{LoadGeneration, Session, UserProfile};
pub use view::{StepView, StepsView, TraceView};
