/// This module provides the XBase (DBF) readers.
pub mod xbase;
