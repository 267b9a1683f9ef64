pub mod generation_task;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use rest::{
    create_document_handler, delete_document_handler, export_document_handler,
    get_document_handler, update_document_handler, upload_image_handler,
};
pub use ws_handler::ws_handler;
