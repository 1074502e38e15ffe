//! Structured snapshot of one intercepted call.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ash::vk;
use ash::vk::Handle;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    Null,
    Handle(u64),
    UInt(u64),
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    /// Symbolic enum or flag value together with its raw number.
    Enum { name: String, raw: i64 },
    List(Vec<ArgValue>),
    /// Structure passed by pointer, as named members.
    Struct(Vec<Arg>),
}

impl ArgValue {
    pub fn handle<H: Handle>(h: H) -> Self {
        ArgValue::Handle(h.as_raw())
    }

    pub fn handles<H: Handle + Copy>(hs: &[H]) -> Self {
        ArgValue::List(hs.iter().map(|h| ArgValue::handle(*h)).collect())
    }

    pub fn result(r: vk::Result) -> Self {
        ArgValue::Enum {
            name: format!("{:?}", r),
            raw: r.as_raw() as i64,
        }
    }

    /// Pointer-typed argument; null pointers are recorded as `Null`.
    pub fn pointer<T>(p: *const T) -> Self {
        if p.is_null() {
            ArgValue::Null
        } else {
            ArgValue::UInt(p as usize as u64)
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => f.write_str("NULL"),
            ArgValue::Handle(0) => f.write_str("VK_NULL_HANDLE"),
            ArgValue::Handle(h) => write!(f, "{:#x}", h),
            ArgValue::UInt(v) => write!(f, "{}", v),
            ArgValue::Int(v) => write!(f, "{}", v),
            ArgValue::Float(v) => write!(f, "{}", v),
            ArgValue::Bool(v) => f.write_str(if *v { "VK_TRUE" } else { "VK_FALSE" }),
            ArgValue::Text(s) => write!(f, "\"{}\"", s),
            ArgValue::Enum { name, raw } => write!(f, "{} ({})", name, raw),
            ArgValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ArgValue::Struct(members) => {
                f.write_str("{")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: {}", member.name, member.value)?;
                }
                f.write_str(" }")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arg {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: &'static str,
    pub value: ArgValue,
}

impl Arg {
    pub fn new(name: &'static str, ty: &'static str, value: ArgValue) -> Self {
        Self { name, ty, value }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub name: &'static str,
    pub thread: u64,
    pub frame: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_us: Option<u64>,
    pub inputs: Vec<Arg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ArgValue>,
    pub outputs: Vec<Arg>,
}

static NEXT_THREAD: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static THREAD_INDEX: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Small, stable index for the calling thread, assigned on first use.
pub fn thread_index() -> u64 {
    THREAD_INDEX.with(|slot| match slot.get() {
        Some(idx) => idx,
        None => {
            let idx = NEXT_THREAD.fetch_add(1, Ordering::Relaxed);
            slot.set(Some(idx));
            idx
        }
    })
}
