pub mod component_code;
pub mod inventory_event;
pub mod location;
pub mod make_code;
pub mod model_code;
pub mod part;
pub mod request;
pub mod request_item;
pub mod system_code;
