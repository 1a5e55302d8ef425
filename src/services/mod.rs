pub mod backup_service;
pub mod itinerary_service;
pub mod matching_service;
pub mod pricing_service;
pub mod quote_service;
pub mod supplier_sheet;
pub mod transfer_service;
