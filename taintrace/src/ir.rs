//! Function-body abstraction supplied by the front end.
//!
//! The engine never sees source text. An external collaborator lowers each
//! function into an ordered operation sequence over value slots: taint
//! production, taint consumption, and calls with argument/result bindings.

use crate::types::TaintKind;
use compact_str::CompactString;
use smallvec::SmallVec;

/// A value slot within one function body.
///
/// Parameters occupy slots `0..param_count`; every operation that produces
/// a value allocates the next slot, so slots are unique within a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(u32);

impl ValueId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Argument bindings of a call site, in callee parameter order.
pub type ArgList = SmallVec<[ValueId; 4]>;

/// One operation in a function body.
#[derive(Debug, Clone)]
pub enum Op {
    /// Produces a value carrying taint of `kind`, at distance zero.
    Source {
        /// Kind of taint produced.
        kind: TaintKind,
        /// Value slot holding the produced value.
        result: ValueId,
    },
    /// Consumes `operand` in a sensitive operation of `kind`.
    Sink {
        /// Kind of sink.
        kind: TaintKind,
        /// Value consumed by the sink.
        operand: ValueId,
    },
    /// Calls `callee`, binding `args` to its parameters in order and
    /// `result` to its return value.
    Call {
        /// Name of the called function; must be defined in the call graph.
        callee: CompactString,
        /// Values passed as arguments.
        args: ArgList,
        /// Value slot receiving the return value.
        result: ValueId,
    },
}

/// Ordered operation sequence plus value bookkeeping for one function.
#[derive(Debug, Clone)]
pub struct FunctionBody {
    param_count: u32,
    value_count: u32,
    ops: Vec<Op>,
    ret: Option<ValueId>,
}

impl FunctionBody {
    /// Creates an empty body for a function with `param_count` parameters.
    #[must_use]
    pub fn new(param_count: u32) -> Self {
        Self {
            param_count,
            value_count: param_count,
            ops: Vec::new(),
            ret: None,
        }
    }

    /// The value slot of parameter `index`.
    ///
    /// # Panics
    /// Panics if `index` is not a declared parameter.
    #[must_use]
    pub fn param(&self, index: u32) -> ValueId {
        assert!(index < self.param_count, "parameter index out of range");
        ValueId(index)
    }

    /// Appends a taint-producing operation and returns the produced value.
    pub fn source(&mut self, kind: impl Into<TaintKind>) -> ValueId {
        let result = self.fresh_value();
        self.ops.push(Op::Source {
            kind: kind.into(),
            result,
        });
        result
    }

    /// Appends a taint-consuming operation.
    pub fn sink(&mut self, kind: impl Into<TaintKind>, operand: ValueId) {
        self.ops.push(Op::Sink {
            kind: kind.into(),
            operand,
        });
    }

    /// Appends a call and returns the value bound to its result.
    pub fn call(&mut self, callee: &str, args: impl IntoIterator<Item = ValueId>) -> ValueId {
        let result = self.fresh_value();
        self.ops.push(Op::Call {
            callee: CompactString::new(callee),
            args: args.into_iter().collect(),
            result,
        });
        result
    }

    /// Marks `value` as the function's return value.
    pub fn set_return(&mut self, value: ValueId) {
        self.ret = Some(value);
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_count as usize
    }

    /// Total number of value slots (parameters plus op results).
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.value_count as usize
    }

    /// The operation sequence, in program order.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// The return value, if the function returns one.
    #[must_use]
    pub fn ret(&self) -> Option<ValueId> {
        self.ret
    }

    fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.value_count);
        self.value_count += 1;
        id
    }
}
