pub mod google_maps;
pub mod shop_backend;
