//! The closed operation set of the Math/Logic Engine (`spec.md` §4.4).
//!
//! Not extensible at runtime — a `Logic` channel's `operation` is one of
//! these variants, decided at registration. Filter/Hysteresis/Debounce
//! operators carry state in the owning channel's scalar parameter slot
//! rather than here, so the enum itself stays `Copy`.

/// One evaluator operation, with its fixed input arity noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    // ─── Arithmetic (up to 4 inputs) ───────────────────────────────
    Add,
    Sub,
    Mul,
    Div,
    Abs,
    /// Clamp input 0 to `[param0, param1]`.
    Clamp,
    Sum,
    Avg,
    Min,
    Max,
    /// Scale input 0 by `param0`.
    Scale,
    /// Linear map of input 0 from `[param0, param1]` to `[param2, param3]`.
    Map,

    // ─── Comparison (1-2 inputs) ────────────────────────────────────
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    /// True if input 0 in `[param0, param1]` inclusive.
    Range,

    // ─── Boolean (up to 4 inputs) ───────────────────────────────────
    And,
    Or,
    Not,
    Xor,

    // ─── Filter (1 input, uses per-channel scalar state) ───────────
    MovingAvg,
    LowPass,
    RateOfChange,

    // ─── Special (2-3 inputs) ───────────────────────────────────────
    Conditional,
    /// `parameters=[low, high, state]`: 1 if input >= high, 0 if input <= low,
    /// else the previous output (held in `state`).
    Hysteresis,
    Debounce,
    /// 0 if `|input| < param0` else `input`.
    Deadband,
}

const EQ_EPSILON: f64 = 1e-3;

/// Evaluate one operation given its resolved input values and parameters.
///
/// `inputs[i]` is `0.0` for a missing/unreferenced channel (`spec.md` §4.4
/// "missing input channel yields 0"). `state` is the per-channel scalar
/// slot for filter/hysteresis operators; the function returns the new
/// output, and the caller is responsible for writing any updated state
/// back (`Hysteresis` returns the new held state via `state_out`).
pub fn evaluate(
    op: LogicOp,
    inputs: &[f64],
    params: &[f64],
    state: f64,
    state_out: &mut f64,
) -> f64 {
    let in0 = inputs.first().copied().unwrap_or(0.0);
    let in1 = inputs.get(1).copied().unwrap_or(0.0);
    let p0 = params.first().copied().unwrap_or(0.0);
    let p1 = params.get(1).copied().unwrap_or(0.0);
    let p2 = params.get(2).copied().unwrap_or(0.0);
    let p3 = params.get(3).copied().unwrap_or(0.0);

    match op {
        LogicOp::Add => inputs.iter().sum(),
        LogicOp::Sub => in0 - in1,
        LogicOp::Mul => inputs.iter().product(),
        LogicOp::Div => {
            if in1 == 0.0 {
                f64::NAN
            } else {
                in0 / in1
            }
        }
        LogicOp::Abs => in0.abs(),
        LogicOp::Clamp => in0.clamp(p0.min(p1), p0.max(p1)),
        LogicOp::Sum => inputs.iter().sum(),
        LogicOp::Avg => {
            if inputs.is_empty() {
                0.0
            } else {
                inputs.iter().sum::<f64>() / inputs.len() as f64
            }
        }
        LogicOp::Min => inputs.iter().copied().fold(f64::INFINITY, f64::min),
        LogicOp::Max => inputs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        LogicOp::Scale => in0 * p0,
        LogicOp::Map => {
            let (src_lo, src_hi, dst_lo, dst_hi) = (p0, p1, p2, p3);
            if (src_hi - src_lo).abs() < f64::EPSILON {
                dst_lo
            } else {
                let t = (in0 - src_lo) / (src_hi - src_lo);
                dst_lo + t * (dst_hi - dst_lo)
            }
        }

        LogicOp::Gt => bool_to_f64(in0 > in1),
        LogicOp::Lt => bool_to_f64(in0 < in1),
        LogicOp::Gte => bool_to_f64(in0 >= in1),
        LogicOp::Lte => bool_to_f64(in0 <= in1),
        LogicOp::Eq => bool_to_f64((in0 - in1).abs() < EQ_EPSILON),
        LogicOp::Range => bool_to_f64(in0 >= p0 && in0 <= p1),

        LogicOp::And => bool_to_f64(inputs.iter().all(|v| truthy(*v))),
        LogicOp::Or => bool_to_f64(inputs.iter().any(|v| truthy(*v))),
        LogicOp::Not => bool_to_f64(!truthy(in0)),
        LogicOp::Xor => {
            let true_count = inputs.iter().filter(|v| truthy(**v)).count();
            bool_to_f64(true_count % 2 == 1)
        }

        LogicOp::MovingAvg | LogicOp::LowPass => {
            // Shared first-order IIR: alpha held in param0, previous output in `state`.
            let alpha = p0.clamp(0.0, 1.0);
            let out = if state.is_nan() {
                in0
            } else {
                state * (1.0 - alpha) + in0 * alpha
            };
            *state_out = out;
            out
        }
        LogicOp::RateOfChange => {
            let out = if state.is_nan() { 0.0 } else { in0 - state };
            *state_out = in0;
            out
        }

        LogicOp::Conditional => {
            if truthy(in0) {
                in1
            } else {
                inputs.get(2).copied().unwrap_or(0.0)
            }
        }
        LogicOp::Hysteresis => {
            let (low, high) = (p0, p1);
            let out = if in0 >= high {
                1.0
            } else if in0 <= low {
                0.0
            } else {
                p2
            };
            *state_out = out;
            out
        }
        LogicOp::Debounce => {
            // Value must persist for param1 consecutive ticks (tracked in state
            // as a run-length counter packed into the integer part).
            let required = p1.max(1.0);
            let run = if (in0 - state.trunc()).abs() < EQ_EPSILON {
                state.fract() * 1e6 + 1.0
            } else {
                1.0
            };
            *state_out = in0.trunc() + run / 1e6;
            bool_to_f64(run >= required)
        }
        LogicOp::Deadband => {
            if in0.abs() < p0 {
                0.0
            } else {
                in0
            }
        }
    }
}

#[inline]
fn truthy(v: f64) -> bool {
    if v.is_nan() {
        false
    } else {
        v != 0.0
    }
}

#[inline]
fn bool_to_f64(v: bool) -> f64 {
    if v {
        1.0
    } else {
        0.0
    }
}
