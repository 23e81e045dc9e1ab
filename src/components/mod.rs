pub mod modal;

pub use modal::{open_modal, ModalOptions};
