//! Buffer pool, record layout, and argument encoding — the allocation-free
//! data path between a producer call and the worker thread.

pub mod argument;
pub mod pool;
pub mod record;

pub use argument::{decode_stream, ArgString, ArgType, ArgumentWriter, DecodedArg, DecodedStep, EnumValue};
pub use pool::{BufferHandle, BufferPool};
pub use record::RecordData;
