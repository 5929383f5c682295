//! Rule-based object graph assembler
//!
//! Types are registered with an [`Instruction`] that tells which constructor to use,
//! where its arguments come from and how long the built instance lives ([`Scope`]).
//! The frozen [`Assembler`] then builds whole object graphs on demand.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use volga_assembler::{AssemblerBuilder, Constructible, Constructor, Instruction, Scope};
//!
//! struct Config {
//!     url: Arc<String>,
//! }
//!
//! struct Repository {
//!     config: Arc<Config>,
//! }
//!
//! impl Constructible for Config {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|url: Arc<String>| Ok(Config { url })).with_names(["url"])]
//!     }
//! }
//!
//! impl Constructible for Repository {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|config: Arc<Config>| Ok(Repository { config }))]
//!     }
//! }
//!
//! let mut builder = AssemblerBuilder::new();
//! builder
//!     .register::<Config>(Instruction::new().value("url", String::from("postgres://localhost")))?
//!     .register::<Repository>(Instruction::new().scope(Scope::Prototype).auto(None))?;
//!
//! let assembler = builder.build();
//! let repository = assembler.assemble_shared::<Repository>()?;
//!
//! assert_eq!(*repository.config.url, "postgres://localhost");
//! # Ok::<(), volga_assembler::error::Error>(())
//! ```

pub use crate::{
    assembler::{Assembler, AssemblerBuilder},
    constructor::{Constructible, Constructor, FromArgument, FromArguments, GenericFactory, Param},
    instruction::{Instruction, ParamSpec, Scope},
    types::{Instance, TypeKey},
};

pub mod error;
pub mod assembler;
pub mod constructor;
pub mod instruction;
pub mod types;

mod capability;
mod registry;
mod resolver;
mod scope;
