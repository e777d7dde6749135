pub mod resource;
pub mod resource_owner;
pub mod storage_object;
pub mod week_resource;
