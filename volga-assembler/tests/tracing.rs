#![allow(missing_docs)]

use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use volga_assembler::{AssemblerBuilder, Constructor, Instruction, Scope, error::Error};

struct Parent(Arc<Child>);
struct Child(Arc<Parent>);

#[test]
fn it_assembles_with_subscriber_installed() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("volga_assembler=trace"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .init();

    let mut builder = AssemblerBuilder::new();
    builder
        .register_with(
            vec![Constructor::new(|child: Arc<Child>| Ok(Parent(child)))],
            Instruction::new().scope(Scope::Prototype).auto(None)
        ).unwrap()
        .register_with(
            vec![Constructor::new(|parent: Arc<Parent>| Ok(Child(parent)))],
            Instruction::new().auto(None)
        ).unwrap()
        .register_with(
            vec![Constructor::new(|value: Arc<u64>| Ok(*value))],
            Instruction::new().scope(Scope::ThreadLocal).value(None, 42u64)
        ).unwrap();

    let rejected = builder.register_with(
        vec![Constructor::new(|value: Arc<u64>| Ok(value.to_string()))],
        Instruction::new().value(None, "wrong")
    );
    assert!(matches!(rejected, Err(Error::NoMatchingConstructor(_))));

    let assembler = builder.build();

    assert!(matches!(assembler.assemble_shared::<Parent>(), Err(Error::CyclicDependency { .. })));
    assert_eq!(assembler.assemble::<u64>().unwrap(), 42);
}
