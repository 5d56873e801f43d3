#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # XBase input for batch pipelines

 Reads legacy dBase / FoxPro (`.dbf`) tables as typed rows, one item at a
 time, behind the same `ItemReader` abstraction as the rest of a batch
 pipeline. Files can be plain or compressed, and several files can be read
 as one stream of rows sharing a merged schema.

 ## Core Concepts

- **ItemReader:** retrieval of input one item at a time; `Ok(None)` marks the end of data.
- **DbfReader:** a decoding session over one DBF stream. It discovers the schema
  when opened, then decodes one record per call.
- **XBaseItemReader:** an `ItemReader` over a list of files (directories filtered by
  masks, optional compression, row limit, file name and row number columns).
- **CompressionProvider:** a named decompression algorithm, selected at runtime.

 ## Features

| **Feature** | **Description**                                        |
|-------------|--------------------------------------------------------|
| zip         | Enables the `Zip` compression provider                 |
| gzip        | Enables the `GZip` compression provider                |
| full        | Enables all available features                         |

 ## Getting Started

```toml
[dependencies]
xbase-batch-rs = { version = "<version>", features = ["<full|zip|gzip>"] }
```

```no_run
use xbase_batch_rs::{
    BatchError,
    core::item::ItemReader,
    item::xbase::{file_list::FileSpec, xbase_item_reader::XBaseItemReaderBuilder},
};

fn main() -> Result<(), BatchError> {
    let reader = XBaseItemReaderBuilder::new()
        .file(FileSpec::new("exports").mask(r".*\.dbf").required(true))
        .charset("cp1252")
        .rownr_field("rownr")
        .build()?;

    for field in reader.fields() {
        println!("{} {} {:?}", field.name, field.value_type, field.length);
    }

    while let Some(row) = reader.read()? {
        println!("{}", serde_json::to_string(&row).unwrap_or_default());
    }

    Ok(())
}
```

 ## License
 Licensed under either of Apache License, Version 2.0 or MIT license, at your option.
 */

/// Core abstractions shared by readers
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Compression providers and the full-read stream adapter
pub mod compression;

/// Set of item readers
pub mod item;
