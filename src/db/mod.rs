//! Database connection pool module.
//!
//! Provides async PostgreSQL connection pooling using diesel_async with bb8.

mod pool;

pub use pool::{
    AsyncDbPool, MIGRATIONS, PooledConn, establish_async_connection_pool, get_connection,
    run_pending_migrations,
};
