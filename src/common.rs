pub mod codes;
pub mod db_utils;
pub mod error;
pub mod i18n;
pub mod json;
pub mod lenient;
pub mod quantity;
pub mod sorting;
