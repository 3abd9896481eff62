mod versioned_schema;

pub use versioned_schema::{
    Column, SqlType, Table, UniqueIndex, VersionedSchema, BASE_DB_VERSION,
};
