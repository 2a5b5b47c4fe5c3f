pub mod download_form;
pub mod notification;
pub mod top;
pub mod video_list;

pub use top::Top;
