//! Dispatch loop and instruction handlers

use super::alphabet::{self, printable};
use super::env::VariableStore;
use super::error::{InterpResult, RuntimeError};
use super::record::{
    ConditionRecord, ContextRecord, CreateRecord, DeclaredKind, ModifyRecord, Opcode,
    PrintRecord, Record, var_id,
};
use super::stream::{DigitStream, decode_digits};
use super::table::{self, ComparisonFn};
use super::value::{Operand, VarKind, Variable, parse_fixed_point, parse_number};
use super::{Context, ExecMode, Outcome, RunOptions};
use std::io::{self, Stdout, Write};
use tracing::debug;

/// Body terminator for loops
pub const LOOP_TERMINATOR: &str = "1999";
/// Body terminator for single-shot conditionals
pub const IF_TERMINATOR: &str = "2000";

/// Stack growth parameters for deeply nested bodies
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// What the dispatch loop does after one instruction
enum Step<'a> {
    /// Keep dispatching from here
    Next(DigitStream<'a>),
    /// CONTINUE was read
    Abort,
    /// Run the rest of the stream under a new context
    Enter(Context, DigitStream<'a>),
    /// Run a conditional or loop body, then continue after it
    Block(ConditionPlan<'a>),
}

/// A located condition body, ready to run
pub struct ConditionPlan<'a> {
    pub target: u8,
    pub comparison: Option<ComparisonFn>,
    pub operand: Operand,
    pub is_loop: bool,
    pub body: DigitStream<'a>,
    /// Whatever follows the terminator
    pub continuation: DigitStream<'a>,
}

impl ConditionPlan<'_> {
    /// Evaluate the comparison against the target's current value.
    pub fn holds(&self, store: &VariableStore) -> bool {
        let Some(compare) = self.comparison else {
            return false;
        };
        match store.get(self.target) {
            Some(var) => compare(var, &self.operand),
            None => compare(&store.get_or_default(self.target), &self.operand),
        }
    }
}

/// Explicit frames for iterative execution
enum Frame<'a> {
    Dispatch { ctx: Context, rest: DigitStream<'a> },
    /// A loop whose body frame sits above it
    Loop { ctx: Context, plan: ConditionPlan<'a> },
}

/// The interpreter
pub struct Interpreter<W: Write = Stdout> {
    /// Context programs start under
    context: Context,
    options: RunOptions,
    /// Variables for this run
    store: VariableStore,
    /// Printed lines go here
    out: W,
}

impl Interpreter<Stdout> {
    /// Create an interpreter printing to stdout
    pub fn new(context: Context) -> Self {
        Interpreter::with_writer(context, io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    /// Create an interpreter printing to `out`
    pub fn with_writer(context: Context, out: W) -> Self {
        Interpreter {
            context,
            options: RunOptions::default(),
            store: VariableStore::new(),
            out,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    pub fn variables(&self) -> &VariableStore {
        &self.store
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /// Run a whole program under the interpreter's context.
    pub fn run(&mut self, program: &str) -> InterpResult<Outcome> {
        let ctx = self.context;
        self.evaluate(ctx, DigitStream::new(program))
    }

    /// Dispatch over `stream` until it is exhausted or CONTINUE is read.
    pub fn evaluate(&mut self, ctx: Context, stream: DigitStream<'_>) -> InterpResult<Outcome> {
        match self.options.mode {
            ExecMode::Recursive => self.dispatch(ctx, stream),
            ExecMode::Iterative => self.dispatch_iterative(ctx, stream),
        }
    }

    /// Add a command line argument as a variable, counting down from the
    /// highest ID the context's window can spell. Returns the ID used.
    pub fn inject_arg(&mut self, arg: &str) -> u8 {
        let is_text = arg.chars().any(|c| c.is_alphabetic() && c != '.');
        let exp = u32::try_from(self.context.window).unwrap_or(u32::MAX);
        let top = 10u64.saturating_pow(exp).saturating_sub(1).min(u64::from(u8::MAX));
        let mut id = top as u8;
        while self.store.contains(id) && id > 0 {
            id -= 1;
        }

        let var = if is_text {
            Variable::text(id, arg)
        } else {
            let number = arg
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0);
            Variable {
                id,
                kind: VarKind::Number,
                size: arg.len(),
                text: arg.to_string(),
                number,
            }
        };
        debug!(id, arg, "argument variable");
        self.store.define(var);
        id
    }

    // ============ Dispatch ============

    /// Recursive dispatch, growing the stack when nesting gets deep
    fn dispatch(&mut self, ctx: Context, stream: DigitStream<'_>) -> InterpResult<Outcome> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.dispatch_inner(ctx, stream)
        })
    }

    fn dispatch_inner(&mut self, ctx: Context, stream: DigitStream<'_>) -> InterpResult<Outcome> {
        let mut rest = stream;
        while let Some((opcode, tail)) = rest.take_group(ctx.window) {
            match self.step(ctx, opcode, tail)? {
                Step::Next(next) => rest = next,
                Step::Abort => return Ok(Outcome::Aborted),
                Step::Enter(inner, remainder) => return self.dispatch(inner, remainder),
                Step::Block(plan) => {
                    if self.run_block(ctx, &plan)? == Outcome::Aborted {
                        return Ok(Outcome::Aborted);
                    }
                    rest = plan.continuation;
                }
            }
        }
        Ok(Outcome::Finished)
    }

    fn run_block(&mut self, ctx: Context, plan: &ConditionPlan<'_>) -> InterpResult<Outcome> {
        if !plan.is_loop {
            if plan.holds(&self.store) {
                return self.dispatch(ctx, plan.body);
            }
            return Ok(Outcome::Finished);
        }

        while plan.holds(&self.store) {
            if ctx.debug {
                debug!(body = %plan.body, "loop iteration");
            }
            if self.dispatch(ctx, plan.body)? == Outcome::Aborted {
                return Ok(Outcome::Aborted);
            }
        }
        Ok(Outcome::Finished)
    }

    /// Dispatch with an explicit frame stack instead of host recursion
    fn dispatch_iterative(
        &mut self,
        ctx: Context,
        stream: DigitStream<'_>,
    ) -> InterpResult<Outcome> {
        let mut frames = vec![Frame::Dispatch { ctx, rest: stream }];

        while let Some(frame) = frames.last_mut() {
            let mut push = Vec::new();
            let mut pop = false;

            match frame {
                Frame::Dispatch { ctx, rest } => match rest.take_group(ctx.window) {
                    None => pop = true,
                    Some((opcode, tail)) => match self.step(*ctx, opcode, tail)? {
                        Step::Next(next) => *rest = next,
                        Step::Abort => return Ok(Outcome::Aborted),
                        Step::Enter(inner, remainder) => {
                            *ctx = inner;
                            *rest = remainder;
                        }
                        Step::Block(plan) => {
                            *rest = plan.continuation;
                            if plan.holds(&self.store) {
                                let body = Frame::Dispatch {
                                    ctx: *ctx,
                                    rest: plan.body,
                                };
                                if plan.is_loop {
                                    push.push(Frame::Loop { ctx: *ctx, plan });
                                }
                                push.push(body);
                            }
                        }
                    },
                },
                // The body above this frame just finished
                Frame::Loop { ctx, plan } => {
                    if plan.holds(&self.store) {
                        push.push(Frame::Dispatch {
                            ctx: *ctx,
                            rest: plan.body,
                        });
                    } else {
                        pop = true;
                    }
                }
            }

            if pop {
                frames.pop();
            }
            frames.extend(push);
        }
        Ok(Outcome::Finished)
    }

    /// Execute the instruction selected by `opcode`.
    fn step<'a>(
        &mut self,
        ctx: Context,
        opcode: DigitStream<'a>,
        rest: DigitStream<'a>,
    ) -> InterpResult<Step<'a>> {
        let trace = ctx.debug;
        if trace {
            debug!(offset = opcode.offset(), "Parse: [{opcode}]{rest}");
        }
        let Some(op) = Opcode::from_value(opcode.value()) else {
            return Ok(Step::Next(rest));
        };
        let window = ctx.window;
        let end = rest.split(rest.len()).1;

        let step = match op {
            Opcode::Continue => Step::Abort,
            Opcode::Print => match PrintRecord::decode(rest, window, trace) {
                Some((rec, payload)) => {
                    Step::Next(self.exec_print(ctx, rec, rest.offset(), payload)?.unwrap_or(end))
                }
                None => Step::Next(end),
            },
            Opcode::Create => Step::Next(
                CreateRecord::decode(rest, window, trace)
                    .and_then(|(rec, payload)| self.exec_create(ctx, rec, payload))
                    .unwrap_or(end),
            ),
            Opcode::Modify => Step::Next(
                ModifyRecord::decode(rest, window, trace)
                    .and_then(|(rec, payload)| self.exec_modify(ctx, rec, payload))
                    .unwrap_or(end),
            ),
            Opcode::Condition => match ConditionRecord::decode(rest, window, trace)
                .and_then(|(rec, payload)| self.plan_condition(ctx, rec, payload))
            {
                Some(plan) => Step::Block(plan),
                None => Step::Next(end),
            },
            Opcode::SetContext => match ContextRecord::decode(rest, window, trace) {
                Some((rec, remainder)) => {
                    let inner = Context {
                        window: if rec.window == 0 { window } else { rec.window },
                        debug: rec.debug,
                    };
                    if trace || inner.debug {
                        debug!(window = inner.window, debug = inner.debug, "new context");
                    }
                    Step::Enter(inner, remainder)
                }
                None => Step::Next(end),
            },
        };
        Ok(step)
    }

    // ============ Handlers ============

    /// Print text or a variable's value as one line.
    fn exec_print<'a>(
        &mut self,
        ctx: Context,
        rec: PrintRecord,
        record_offset: usize,
        payload: DigitStream<'a>,
    ) -> InterpResult<Option<DigitStream<'a>>> {
        let Some((digits, rest)) = accumulate(payload, ctx.window, rec.size, ctx.debug) else {
            return Ok(None);
        };

        let line = match rec.kind {
            PrintRecord::TEXT => alphabet::to_text(&digits, ctx.window),
            PrintRecord::VARIABLE => {
                let id = var_id(decode_digits(digits.as_bytes()));
                if ctx.debug {
                    debug!(id, "Print variable");
                }
                self.store.get_or_create(id).display_value()
            }
            other => {
                return Err(RuntimeError::unknown_print_kind(
                    other,
                    record_offset,
                    ctx.window,
                ));
            }
        };

        writeln!(self.out, "{line}")
            .and_then(|()| self.out.flush())
            .map_err(|e| RuntimeError::output(&e, record_offset))?;
        Ok(Some(rest))
    }

    /// Build a variable from its payload and store it, replacing any
    /// variable with the same ID.
    fn exec_create<'a>(
        &mut self,
        ctx: Context,
        rec: CreateRecord,
        payload: DigitStream<'a>,
    ) -> Option<DigitStream<'a>> {
        let (var, rest) = match rec.kind {
            DeclaredKind::Text => {
                let (groups, rest) = accumulate_groups(payload, ctx.window, rec.size, ctx.debug)?;
                let text: String = groups.iter().filter_map(|g| printable(g.value())).collect();
                let var = Variable {
                    id: rec.id,
                    kind: VarKind::Text,
                    size: rec.size,
                    text,
                    number: 0.0,
                };
                (var, rest)
            }
            DeclaredKind::Number | DeclaredKind::FixedPoint => {
                let (digits, rest) = accumulate(payload, ctx.window, rec.size, ctx.debug)?;
                let number = if rec.kind == DeclaredKind::FixedPoint {
                    parse_fixed_point(&digits)
                } else {
                    parse_number(&digits)
                };
                let var = Variable {
                    id: rec.id,
                    kind: VarKind::Number,
                    size: rec.size,
                    text: digits,
                    number,
                };
                (var, rest)
            }
            DeclaredKind::Alias => {
                let (digits, rest) = accumulate(payload, ctx.window, rec.size, ctx.debug)?;
                let source = self.store.get_or_default(var_id(decode_digits(digits.as_bytes())));
                let var = Variable {
                    id: rec.id,
                    ..source
                };
                (var, rest)
            }
            DeclaredKind::Other(_) => {
                let (digits, rest) = accumulate(payload, ctx.window, rec.size, ctx.debug)?;
                let var = Variable {
                    id: rec.id,
                    kind: VarKind::Unset,
                    size: rec.size,
                    number: parse_number(&digits),
                    text: digits,
                };
                (var, rest)
            }
        };

        if ctx.debug {
            debug!(var = %var, "created");
        }
        self.store.define(var);
        Some(rest)
    }

    /// Apply a modifier to a variable in place.
    fn exec_modify<'a>(
        &mut self,
        ctx: Context,
        rec: ModifyRecord,
        payload: DigitStream<'a>,
    ) -> Option<DigitStream<'a>> {
        let (digits, rest) = accumulate(payload, ctx.window, rec.size, ctx.debug)?;

        let operand = if rec.operand_is_ref {
            let source = var_id(decode_digits(digits.as_bytes()));
            match self.store.get(source) {
                Some(var) => Operand::from_variable(var),
                None => Operand::from_variable(&self.store.get_or_default(source)),
            }
        } else {
            Operand::from_digits(&digits, ctx.window)
        };

        if let Some(apply) = table::modifier(rec.op) {
            let target = self.store.get_or_create(rec.target);
            apply(target, &operand);
            if ctx.debug {
                debug!(op = rec.op, var = %target, "modified");
            }
        }
        Some(rest)
    }

    /// Read a condition's operand and find its body.
    fn plan_condition<'a>(
        &self,
        ctx: Context,
        rec: ConditionRecord,
        payload: DigitStream<'a>,
    ) -> Option<ConditionPlan<'a>> {
        let (digits, after) = accumulate(payload, ctx.window, rec.size, ctx.debug)?;
        let terminator = if rec.is_loop {
            LOOP_TERMINATOR
        } else {
            IF_TERMINATOR
        };

        let (body, continuation) = match after.find(terminator) {
            Some(at) => {
                let (body, tail) = after.split(at);
                (body, tail.split(terminator.len()).1)
            }
            None => (after, after.split(after.len()).1),
        };

        if ctx.debug {
            debug!(%body, %continuation, is_loop = rec.is_loop, "condition body");
        }

        Some(ConditionPlan {
            target: rec.target,
            comparison: table::comparison(rec.comparison),
            operand: Operand::from_digits(&digits, ctx.window),
            is_loop: rec.is_loop,
            body,
            continuation,
        })
    }
}

/// Collect groups until the buffer holds `size` digits, then cut it to
/// exactly `size`. At least one group is always taken, and the last group
/// may be short if the stream ends inside it.
fn accumulate(
    stream: DigitStream<'_>,
    window: usize,
    size: usize,
    trace: bool,
) -> Option<(String, DigitStream<'_>)> {
    let mut buf = String::new();
    let mut rest = stream;
    loop {
        if rest.is_empty() {
            return None;
        }
        let (group, tail) = rest.split(window);
        if trace {
            debug!(offset = group.offset(), "(+ value: [{group}]{tail})");
        }
        push_digits(&mut buf, group);
        rest = tail;
        if buf.len() >= size {
            break;
        }
    }
    buf.truncate(size);
    Some((buf, rest))
}

/// Append a group's digits. A group holding anything but ASCII digits
/// decodes as 0, so it contributes that many zeros.
fn push_digits(buf: &mut String, group: DigitStream<'_>) {
    if group.as_bytes().iter().all(u8::is_ascii_digit) {
        buf.push_str(group.as_str());
    } else {
        buf.extend(std::iter::repeat_n('0', group.len()));
    }
}

/// Like [`accumulate`], counting groups instead of digits.
fn accumulate_groups(
    stream: DigitStream<'_>,
    window: usize,
    count: usize,
    trace: bool,
) -> Option<(Vec<DigitStream<'_>>, DigitStream<'_>)> {
    let mut groups = Vec::new();
    let mut rest = stream;
    loop {
        if rest.is_empty() {
            return None;
        }
        let (group, tail) = rest.split(window);
        if trace {
            debug!(offset = group.offset(), "(+ char: [{group}]{tail})");
        }
        groups.push(group);
        rest = tail;
        if groups.len() >= count {
            break;
        }
    }
    groups.truncate(count);
    Some((groups, rest))
}
