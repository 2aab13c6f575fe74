pub mod google_timezone_service;
