use std::collections::HashMap;
use std::rc::Rc;

use nangosha_lang as lang;

use lang::ast::{FunctionDecl, Identifier};
use lang::callable::{Callable, Function, NativeFunction};
use lang::class::{Class, Instance};
use lang::environment::Environment;
use lang::{Interpreter, Status, Value};

fn nothing(_: &[Value]) -> Result<Value, String> {
    Ok(Value::Nil)
}

fn declaration(name: &str, params: &[&str]) -> Rc<FunctionDecl> {
    Rc::new(FunctionDecl {
        name: Identifier::new(name, 1),
        params: params.iter().map(|p| Identifier::new(*p, 1)).collect(),
        body: Vec::new(),
    })
}

fn class_with(name: &str, superclass: Option<Rc<Class>>, methods: &[(&str, &[&str])]) -> Rc<Class> {
    let closure = Environment::new_global();

    let methods: HashMap<String, Function> = methods
        .iter()
        .map(|(method, params)| {
            (
                method.to_string(),
                Function::new(declaration(method, params), Rc::clone(&closure)),
            )
        })
        .collect();

    Rc::new(Class::new(name, superclass, methods))
}

/// Runs `source` silently and returns the global `name`.
fn global_after(source: &str, name: &str) -> Value {
    let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));
    let mut errors: Vec<(usize, String)> = Vec::new();

    assert_eq!(lang::run(&mut interpreter, source, &mut errors), Status::Success);

    let value = interpreter.globals().borrow().get(name, 0).unwrap();
    value
}

#[test]
fn function_arity_counts_parameters() {
    let function = Function::new(declaration("add", &["a", "b"]), Environment::new_global());

    assert_eq!(function.arity(), 2);
    assert_eq!(function.name(), "add");
}

#[test]
fn bind_leaves_the_original_untouched() {
    let class = class_with("Point", None, &[("norm", &[])]);
    let instance = Rc::new(Instance::new(Rc::clone(&class)));

    let method = class.find_method("norm").unwrap();
    let bound = method.bind(&instance);

    // The bound copy sees `this`, the original does not.
    assert!(bound.closure().borrow().contains_local("this"));
    assert!(!method.closure().borrow().contains_local("this"));
    assert!(method.closure().borrow().get("this", 1).is_err());

    assert!(Rc::ptr_eq(bound.declaration(), method.declaration()));
    assert_eq!(bound.closure().borrow().depth(), method.closure().borrow().depth() + 1);

    match bound.closure().borrow().get("this", 1).unwrap() {
        Value::Instance(this) => assert!(Rc::ptr_eq(&this, &instance)),
        other => panic!("expected instance, got {}", other),
    };
}

#[test]
fn find_method_prefers_most_derived() {
    let base = class_with("A", None, &[("greet", &[]), ("only_base", &["x"])]);
    let derived = class_with("B", Some(Rc::clone(&base)), &[("greet", &["loud"])]);

    assert_eq!(derived.find_method("greet").unwrap().arity(), 1);
    assert_eq!(base.find_method("greet").unwrap().arity(), 0);
    assert_eq!(derived.find_method("only_base").unwrap().arity(), 1);
    assert!(derived.find_method("missing").is_none());

    assert_eq!(derived.superclass().map(|s| s.name()), Some("A"));
}

#[test]
fn class_arity_follows_initializer() {
    let plain = class_with("Plain", None, &[]);
    assert_eq!(plain.arity(), 0);

    let base = class_with("Base", None, &[("init", &["a", "b"])]);
    let derived = class_with("Derived", Some(Rc::clone(&base)), &[]);

    assert_eq!(base.arity(), 2);
    assert_eq!(derived.arity(), 2);
    assert_eq!(Callable::Class(derived).arity(), 2);
}

#[test]
fn method_access_binds_anew_each_time() {
    let class = class_with("Thing", None, &[("go", &[])]);
    let instance = Rc::new(Instance::new(class));

    let first = instance.get("go", 1).unwrap();
    let second = instance.get("go", 1).unwrap();

    assert!(matches!(first, Value::Callable(Callable::Function(_))));
    assert_ne!(first, second);
}

#[test]
fn fields_shadow_methods_and_are_created_on_write() {
    let class = class_with("Thing", None, &[("go", &[])]);
    let instance = Rc::new(Instance::new(class));

    assert!(instance.field("go").is_none());

    instance.set("go", Value::Number(1.0));
    assert_eq!(instance.get("go", 1).unwrap(), Value::Number(1.0));

    instance.set("go", Value::from("again"));
    assert_eq!(instance.field("go"), Some(Value::from("again")));
}

#[test]
fn missing_property_is_an_error() {
    let class = class_with("Empty", None, &[]);
    let instance = Rc::new(Instance::new(class));

    let err = instance.get("ghost", 5).unwrap_err();
    assert_eq!(err.message(), "Undefined property 'ghost'.");
    assert_eq!(err.line(), Some(5));
}

#[test]
fn display_formats() {
    let function = Function::new(declaration("f", &[]), Environment::new_global());
    let class = class_with("Shape", None, &[]);
    let instance = Rc::new(Instance::new(Rc::clone(&class)));
    let native = NativeFunction::new("clock", 0, nothing);

    assert_eq!(Callable::Function(Rc::new(function)).to_string(), "<fn f>");
    assert_eq!(Callable::Class(class).to_string(), "Shape");
    assert_eq!(Callable::Native(Rc::new(native)).to_string(), "<native fn clock>");
    assert_eq!(Value::Instance(instance).to_string(), "Shape");
}

#[test]
fn callables_compare_by_identity() {
    let a = class_with("Same", None, &[]);
    let b = class_with("Same", None, &[]);

    assert!(Callable::Class(Rc::clone(&a)).same_as(&Callable::Class(Rc::clone(&a))));
    assert_ne!(
        Value::Callable(Callable::Class(a)),
        Value::Callable(Callable::Class(b))
    );
}

#[test]
fn declared_subclass_links_to_its_superclass() {
    let value = global_after("class A { m() {} } class B < A {}", "B");

    let class = match value {
        Value::Callable(Callable::Class(class)) => class,
        other => panic!("expected class, got {}", other),
    };

    assert_eq!(class.name(), "B");
    assert_eq!(class.superclass().map(|s| s.name()), Some("A"));
    assert!(class.find_method("m").is_some());
}

#[test]
fn native_errors_become_runtime_errors() {
    fn fail(_: &[Value]) -> Result<Value, String> {
        Err("native failure".to_string())
    }

    let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));
    interpreter.define_native(NativeFunction::new("fail", 0, fail));

    let mut errors: Vec<(usize, String)> = Vec::new();
    let status = lang::run(&mut interpreter, "\nfail();", &mut errors);

    assert_eq!(status, Status::RuntimeError);
    assert_eq!(errors, vec![(2, "native failure".to_string())]);
}
