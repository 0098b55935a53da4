//! Argo DSL: script functions to Argo Workflows templates
//!
//! Compiles a template definition (a name, an ordered parameter list and a
//! manifest) into an Argo `Template`. Script templates can also be derived
//! from the source text of a Python function: its signature becomes the
//! parameter schema, and its docstring or literal return value becomes the
//! script.
//!
//! # Parameter encoding
//!
//! Defaults and step arguments are encoded by one table, keyed by the
//! declared type:
//!
//! | Declared type                     | Encoded as                    |
//! |-----------------------------------|-------------------------------|
//! | `str`, `Literal[...]`             | the text itself               |
//! | `int`, `float`, `bool`, `complex` | Python literal (`2.0`, `True`)|
//! | `ValueFrom`                       | `valueFrom`, never a literal  |
//! | anything else                     | hex of the JSON bytes         |
//!
//! # Usage
//!
//! ```rust
//! use argo_dsl::{CallArguments, ScriptFlavor, ScriptTemplateBuilder, TaskSteps};
//!
//! let source = r#"
//! def hello(name: str, times: int = 2):
//!     """
//!     for i in $(seq $times); do echo "hello $name"; done
//!     """
//! "#;
//!
//! let hello = ScriptTemplateBuilder::from_source(ScriptFlavor::Bash, source)
//!     .unwrap()
//!     .with_image("bash:5")
//!     .compile()
//!     .unwrap();
//!
//! assert_eq!(hello.name(), "hello");
//! assert_eq!(hello.parameters()[1].default.as_deref(), Some("2"));
//!
//! let mut steps = TaskSteps::new();
//! steps.add(hello.step("first").call(CallArguments::new().with("name", "argo")));
//! steps.parallel(|p| {
//!     p.add(hello.step("a").call(CallArguments::new().with("name", "x")));
//!     p.add(hello.step("b").call(CallArguments::new().with("name", "y")));
//! });
//!
//! let stages = steps
//!     .to_parallel_steps(|name| (name == hello.name()).then_some(&hello))
//!     .unwrap();
//! assert_eq!(stages.len(), 2);
//! assert_eq!(stages[1].len(), 2);
//! ```

#![deny(unsafe_code)]

pub mod compiler;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod hooks;
pub mod introspect;
mod literal;
pub mod manifest;
pub mod parameters;
pub mod render;
pub mod script;
pub mod steps;
pub mod value;

pub use compiler::{CompiledTemplate, TemplateBuilder};
pub use config::{DslConfig, RenderConfig, RenderFormat, ScriptConfig};
pub use encoder::{
    decode_opaque, default_resolve_arguments, encode_argument, encode_default, resolve_arguments,
    shorten_repr, EncodedArgument,
};
pub use errors::{DslError, DslResult};
pub use hooks::{force_image, with_command, Hook, HookChain};
pub use introspect::{introspect, type_from_annotation, ScriptFunction};
pub use manifest::{
    ContainerTemplateBuilder, ManifestKind, ManifestProducer, ManifestSpec,
    ResourceTemplateBuilder,
};
pub use parameters::build_parameters;
pub use script::{ScriptFlavor, ScriptTemplateBuilder};
pub use steps::{
    item, item_field, BatchArguments, ParallelScope, StepOutputs, TaskStep, TaskSteps, ITEM,
};
pub use value::{ArgValue, CallArguments, Complex, ParameterDecl, TypeTag, ValueCategory};

pub use argo_types;
