pub mod fs;
pub mod slug;
