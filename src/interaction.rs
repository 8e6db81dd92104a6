use derive_more::Display;

/// Questions asked before anything is destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Prompt {
    #[display("Delete the four videos of \"{title}\"?\n  {}", files.join("\n  "))]
    DeleteMediaSet { title: String, files: Vec<String> },
    #[display(
        "Folder \"{folder}\" has no videos left. Delete it with its remaining files?\n  {}",
        remaining.join("\n  ")
    )]
    DeleteEmptyFolder {
        folder: String,
        remaining: Vec<String>,
    },
    #[display("Delete folder \"{folder}\" and everything in it?")]
    DeleteFolder { folder: String },
}

/// Outcomes reported back once a step completed, or failed after an earlier
/// step already mutated storage.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Notice {
    #[display("deleted \"{title}\"")]
    MediaSetDeleted { title: String },
    #[display("deleted folder \"{folder}\" ({purged} entries)")]
    FolderDeleted { folder: String, purged: usize },
    #[display("{_0}")]
    Failed(String),
}

/// The synchronous dialog surface. Implemented by whatever front end hosts
/// the viewer.
pub trait UserInteraction {
    fn confirm(&self, prompt: &Prompt) -> bool;
    fn notify(&self, notice: &Notice);
}
