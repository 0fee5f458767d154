//! List manipulation procedures for the Twine Scheme runtime
//!
//! This module implements the fundamental list operations in Scheme:
//! - `car`: Get the first element of a list
//! - `cdr`: Get the rest of a list (all elements except the first)
//! - `cons`: Construct a new list by prepending an element
//! - `list`: Create a new list from multiple arguments
//! - `null?`: Check if a value is the empty list
//! - `length`: Get the number of elements in a list

use crate::error::{Error, Result};
use crate::types::Value;

/// Get the first element of a list (car)
///
/// In Scheme, `car` returns the first element of a non-empty list.
/// It is an error to call `car` on an empty list or a non-list value.
///
/// # Arguments
/// * `args` - Should contain exactly one argument that is a non-empty list
///
/// # Returns
/// * `Ok(Value)` - The first element of the list
/// * `Err(SchemeError)` - If wrong number of arguments, not a list, or empty list
///
/// # Examples
/// ```scheme
/// (car '(1 2 3))     ; => 1
/// (car '((a b) c))   ; => (a b)
/// ```
pub fn car(args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("car", 1, args.len()));
    }

    let list = args[0]
        .as_list()
        .ok_or_else(|| Error::type_error("car", "list", args[0].type_name(), None))?;

    if list.is_empty() {
        return Err(Error::runtime_error("car: cannot take car of empty list"));
    }

    Ok(list.get(0).unwrap().clone())
}

/// Get the rest of a list (cdr)
///
/// In Scheme, `cdr` returns a new list containing all elements except the first.
/// It is an error to call `cdr` on an empty list or a non-list value.
///
/// # Arguments
/// * `args` - Should contain exactly one argument that is a non-empty list
///
/// # Returns
/// * `Ok(Value)` - A new list with all elements except the first
/// * `Err(SchemeError)` - If wrong number of arguments, not a list, or empty list
///
/// # Examples
/// ```scheme
/// (cdr '(1 2 3))     ; => (2 3)
/// (cdr '(a))         ; => ()
/// ```
pub fn cdr(args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("cdr", 1, args.len()));
    }

    let list = args[0]
        .as_list()
        .ok_or_else(|| Error::type_error("cdr", "list", args[0].type_name(), None))?;

    if list.is_empty() {
        return Err(Error::runtime_error("cdr: cannot take cdr of empty list"));
    }

    // Create a new list with all elements except the first
    let rest_values: Vec<Value> = list.iter().skip(1).cloned().collect();
    Ok(Value::list(rest_values))
}

/// Construct a new list by prepending an element (cons)
///
/// In Scheme, `cons` creates a new list with the first argument as the head
/// and the second argument as the tail. The second argument should be a list.
///
/// # Arguments
/// * `args` - Should contain exactly two arguments: element and list
///
/// # Returns
/// * `Ok(Value)` - A new list with the element prepended
/// * `Err(SchemeError)` - If wrong number of arguments or second arg is not a list
///
/// # Examples
/// ```scheme
/// (cons 1 '(2 3))    ; => (1 2 3)
/// (cons 'a '())      ; => (a)
/// ```
pub fn cons(args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_error("cons", 2, args.len()));
    }

    let element = &args[0];
    let tail = args[1]
        .as_list()
        .ok_or_else(|| Error::type_error("cons", "list", args[1].type_name(), Some(2)))?;

    // Create a new list with the element prepended
    let mut new_values = Vec::with_capacity(tail.len() + 1);
    new_values.push(element.clone());
    new_values.extend(tail.iter().cloned());

    Ok(Value::list(new_values))
}

/// Create a new list from multiple arguments (list)
///
/// In Scheme, `list` creates a new list containing all its arguments as elements.
/// This is a convenient way to create lists without using quote.
///
/// # Arguments
/// * `args` - Any number of arguments to include in the list
///
/// # Returns
/// * `Ok(Value)` - A new list containing all arguments as elements
///
/// # Examples
/// ```scheme
/// (list 1 2 3)       ; => (1 2 3)
/// (list)             ; => ()
/// (list 'a (+ 1 2))  ; => (a 3)
/// ```
pub fn list(args: &[Value]) -> Result<Value> {
    Ok(Value::list(args.to_vec()))
}

/// Check if a value is the empty list (null?)
///
/// In Scheme, `null?` returns `#t` if the argument is the empty list, `#f` otherwise.
/// Note that in this implementation, we check for empty lists specifically.
///
/// # Arguments
/// * `args` - Should contain exactly one argument
///
/// # Returns
/// * `Ok(Value)` - `#t` if the argument is an empty list, `#f` otherwise
/// * `Err(SchemeError)` - If wrong number of arguments
///
/// # Examples
/// ```scheme
/// (null? '())        ; => #t
/// (null? '(1 2))     ; => #f
/// (null? 42)         ; => #f
/// ```
pub fn null_p(args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("null?", 1, args.len()));
    }

    let is_null = match &args[0] {
        Value::List(list) => list.is_empty(),
        _ => false,
    };

    Ok(Value::boolean(is_null))
}

/// Get the number of elements in a list (length)
///
/// In Scheme, `length` returns the number of elements in a list.
/// It only accepts lists as arguments.
///
/// # Arguments
/// * `args` - Should contain exactly one argument that is a list
///
/// # Returns
/// * `Ok(Value)` - A number representing the length of the list
/// * `Err(SchemeError)` - If wrong number of arguments or not a list
///
/// # Examples
/// ```scheme
/// (length '())       ; => 0
/// (length '(1 2 3))  ; => 3
/// (length '(a))      ; => 1
/// ```
pub fn length(args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_error("length", 1, args.len()));
    }

    let list = args[0]
        .as_list()
        .ok_or_else(|| Error::type_error("length", "list", args[0].type_name(), None))?;

    Ok(Value::number(list.len() as f64))
}
