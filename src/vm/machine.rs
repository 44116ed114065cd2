use flee_compiler::{Chunk, OpCode};
use flee_core::{PrimitiveKind, TypeHash, Value, primitives};

use super::ops::{self, Arith, Bitwise};
use super::{Environment, EvalError};

/// Run a chunk and return the value it leaves on the stack.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn execute(chunk: &Chunk, env: &dyn Environment) -> Result<Value, EvalError> {
    Machine::new(chunk, env).run()
}

struct Machine<'a> {
    chunk: &'a Chunk,
    env: &'a dyn Environment,
    stack: Vec<Value>,
    temps: Vec<Value>,
    ip: usize,
}

impl<'a> Machine<'a> {
    fn new(chunk: &'a Chunk, env: &'a dyn Environment) -> Self {
        Self {
            chunk,
            env,
            stack: Vec::with_capacity(16),
            temps: vec![Value::Null; chunk.temp_count() as usize],
            ip: 0,
        }
    }

    fn run(mut self) -> Result<Value, EvalError> {
        loop {
            let start = self.ip;
            let op = self.chunk.read_op(start).ok_or(self.invalid())?;
            self.ip = start + op.size();

            match op {
                OpCode::Constant => {
                    let index = self.operand_u32(start)?;
                    let value = self.chunk.constant(index).cloned().ok_or(self.invalid())?;
                    self.stack.push(value);
                }
                OpCode::PushNull => self.stack.push(Value::Null),
                OpCode::PushTrue => self.stack.push(Value::Bool(true)),
                OpCode::PushFalse => self.stack.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::Dup => {
                    let top = self.peek()?.clone();
                    self.stack.push(top);
                }
                OpCode::LoadTemp => {
                    let slot = self.operand_u8(start)? as usize;
                    let value = self.temps.get(slot).cloned().ok_or(self.invalid())?;
                    self.stack.push(value);
                }
                OpCode::StoreTemp => {
                    let slot = self.operand_u8(start)? as usize;
                    let value = self.pop()?;
                    let invalid = self.invalid();
                    *self.temps.get_mut(slot).ok_or(invalid)? = value;
                }

                OpCode::LoadOwner => self.stack.push(self.env.owner().clone()),
                OpCode::LoadVariable => {
                    let name = self.operand_name(start)?;
                    let value = self.env.variable(name)?;
                    self.stack.push(value);
                }
                OpCode::LoadCalcResult => {
                    let name = self.operand_name(start)?;
                    let value = self.env.calc_result(name)?;
                    self.stack.push(value);
                }

                OpCode::Call => self.call(start)?,
                OpCode::CallExternal => {
                    let name = self.operand_name(start)?;
                    let count = self.chunk.read_u16(start + 5).ok_or(self.invalid())? as usize;
                    let args = self.pop_n(count)?;
                    let value = self.env.call_function(name, &args)?;
                    self.stack.push(value);
                }

                OpCode::PackArray => {
                    let element = self.operand_type(start)?;
                    let count = self.chunk.read_u16(start + 5).ok_or(self.invalid())? as usize;
                    let items = self.pop_n(count)?;
                    self.stack.push(Value::array(element, items));
                }
                OpCode::LoadElement => {
                    let index = self.pop()?;
                    let array = self.pop()?;
                    self.stack.push(load_element(array, index)?);
                }

                OpCode::Add => self.arithmetic(Arith::Add, false)?,
                OpCode::Sub => self.arithmetic(Arith::Sub, false)?,
                OpCode::Mul => self.arithmetic(Arith::Mul, false)?,
                OpCode::Div => self.arithmetic(Arith::Div, false)?,
                OpCode::Mod => self.arithmetic(Arith::Mod, false)?,
                OpCode::AddChecked => self.arithmetic(Arith::Add, true)?,
                OpCode::SubChecked => self.arithmetic(Arith::Sub, true)?,
                OpCode::MulChecked => self.arithmetic(Arith::Mul, true)?,
                OpCode::Pow => {
                    let (base, exponent) = self.pop_pair()?;
                    self.stack.push(ops::power(base, exponent)?);
                }
                OpCode::Neg => {
                    let value = self.pop()?;
                    self.stack.push(ops::negate(value)?);
                }
                OpCode::Concat => {
                    let (left, right) = self.pop_pair()?;
                    self.stack.push(ops::concat(&left, &right));
                }

                OpCode::And => self.bitwise(Bitwise::And)?,
                OpCode::Or => self.bitwise(Bitwise::Or)?,
                OpCode::Xor => self.bitwise(Bitwise::Xor)?,
                OpCode::Not => {
                    let value = self.pop()?;
                    self.stack.push(ops::not(value)?);
                }
                OpCode::Shl | OpCode::Shr => {
                    let (value, count) = self.pop_pair()?;
                    self.stack.push(ops::shift(op == OpCode::Shl, value, count)?);
                }

                OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Gt | OpCode::Le | OpCode::Ge => {
                    let (left, right) = self.pop_pair()?;
                    let ordering = ops::compare(compare_symbol(op), &left, &right)?;
                    let result = match op {
                        OpCode::Eq => ordering.is_some_and(|o| o.is_eq()),
                        OpCode::Ne => !ordering.is_some_and(|o| o.is_eq()),
                        OpCode::Lt => ordering.is_some_and(|o| o.is_lt()),
                        OpCode::Gt => ordering.is_some_and(|o| o.is_gt()),
                        OpCode::Le => ordering.is_some_and(|o| o.is_le()),
                        _ => ordering.is_some_and(|o| o.is_ge()),
                    };
                    self.stack.push(Value::Bool(result));
                }
                OpCode::StrEq | OpCode::StrEqIgnoreCase => {
                    let (left, right) = self.pop_pair()?;
                    let equal = ops::string_equals(&left, &right, op == OpCode::StrEqIgnoreCase)?;
                    self.stack.push(Value::Bool(equal));
                }
                OpCode::RefEq => {
                    let (left, right) = self.pop_pair()?;
                    self.stack.push(Value::Bool(ops::reference_equals(&left, &right)));
                }

                OpCode::Convert | OpCode::ConvertChecked => {
                    let kind = PrimitiveKind::try_from(self.operand_u8(start)?).map_err(|_| self.invalid())?;
                    let value = self.pop()?;
                    self.stack.push(value.convert(kind, op == OpCode::ConvertChecked)?);
                }
                OpCode::ToEnum => {
                    let ty = self.operand_type(start)?;
                    let value = self.pop()?;
                    let raw = value.as_i128().ok_or_else(|| EvalError::InvalidCast {
                        from: value.type_name(),
                        to: self.env.resolver().type_name(ty),
                    })?;
                    self.stack.push(Value::Enum { ty, value: raw as i64 });
                }
                OpCode::CastCheck => {
                    let ty = self.operand_type(start)?;
                    let value = self.peek()?;
                    if !is_instance_of(value, ty, self.env) {
                        return Err(EvalError::InvalidCast {
                            from: self.env.resolver().type_name(value.type_hash()),
                            to: self.env.resolver().type_name(ty),
                        });
                    }
                }

                OpCode::Jump | OpCode::JumpLong => {
                    let displacement = self.displacement(op, start)?;
                    self.jump(displacement)?;
                }
                OpCode::JumpIfFalse
                | OpCode::JumpIfTrue
                | OpCode::JumpIfFalseLong
                | OpCode::JumpIfTrueLong => {
                    let displacement = self.displacement(op, start)?;
                    let condition = self.pop()?.as_bool().ok_or(self.invalid())?;
                    let wanted = matches!(op, OpCode::JumpIfTrue | OpCode::JumpIfTrueLong);
                    if condition == wanted {
                        self.jump(displacement)?;
                    }
                }

                OpCode::Return => return self.pop(),
            }
        }
    }

    // ==========================================================================
    // Stack
    // ==========================================================================

    fn invalid(&self) -> EvalError {
        EvalError::InvalidBytecode { offset: self.ip }
    }

    fn pop(&mut self) -> Result<Value, EvalError> {
        self.stack.pop().ok_or(self.invalid())
    }

    fn peek(&self) -> Result<&Value, EvalError> {
        self.stack.last().ok_or(self.invalid())
    }

    /// Pop `(second, top)`.
    fn pop_pair(&mut self) -> Result<(Value, Value), EvalError> {
        let right = self.pop()?;
        let left = self.pop()?;
        Ok((left, right))
    }

    /// Pop `count` values, oldest first.
    fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, EvalError> {
        if count > self.stack.len() {
            return Err(self.invalid());
        }
        Ok(self.stack.split_off(self.stack.len() - count))
    }

    // ==========================================================================
    // Operands
    // ==========================================================================

    fn operand_u8(&self, start: usize) -> Result<u8, EvalError> {
        self.chunk.read_byte(start + 1).ok_or(self.invalid())
    }

    fn operand_u32(&self, start: usize) -> Result<u32, EvalError> {
        self.chunk.read_u32(start + 1).ok_or(self.invalid())
    }

    fn operand_name(&self, start: usize) -> Result<&'a str, EvalError> {
        let index = self.operand_u32(start)?;
        let chunk: &'a Chunk = self.chunk;
        chunk.name(index).map(|name| name.as_ref()).ok_or(self.invalid())
    }

    fn operand_type(&self, start: usize) -> Result<TypeHash, EvalError> {
        let index = self.operand_u32(start)?;
        self.chunk.type_at(index).ok_or(self.invalid())
    }

    fn displacement(&self, op: OpCode, start: usize) -> Result<i64, EvalError> {
        let displacement = if op.is_long_branch() {
            self.chunk.read_i32(start + 1).map(i64::from)
        } else {
            self.chunk.read_i8(start + 1).map(i64::from)
        };
        displacement.ok_or(self.invalid())
    }

    /// Move relative to the end of the branch just decoded.
    fn jump(&mut self, displacement: i64) -> Result<(), EvalError> {
        let target = self.ip as i64 + displacement;
        if target < 0 || target as usize > self.chunk.len() {
            return Err(self.invalid());
        }
        self.ip = target as usize;
        Ok(())
    }

    // ==========================================================================
    // Operations
    // ==========================================================================

    fn arithmetic(&mut self, op: Arith, checked: bool) -> Result<(), EvalError> {
        let (left, right) = self.pop_pair()?;
        self.stack.push(ops::arithmetic(op, left, right, checked)?);
        Ok(())
    }

    fn bitwise(&mut self, op: Bitwise) -> Result<(), EvalError> {
        let (left, right) = self.pop_pair()?;
        self.stack.push(ops::bitwise(op, left, right)?);
        Ok(())
    }

    fn call(&mut self, start: usize) -> Result<(), EvalError> {
        let index = self.operand_u32(start)?;
        let chunk: &'a Chunk = self.chunk;
        let target = chunk.function(index).ok_or(self.invalid())?;

        let args = self.pop_n(target.arg_count as usize)?;
        let instance = if target.has_instance {
            let instance = self.pop()?;
            if instance.is_null() {
                return Err(EvalError::NullReference {
                    member: target.name.clone(),
                });
            }
            Some(instance)
        } else {
            None
        };

        let result = target
            .native
            .invoke(instance.as_ref(), &args)
            .map_err(|source| EvalError::Native {
                function: target.name.clone(),
                source,
            })?;
        self.stack.push(result);
        Ok(())
    }
}

fn compare_symbol(op: OpCode) -> &'static str {
    match op {
        OpCode::Eq => "=",
        OpCode::Ne => "<>",
        OpCode::Lt => "<",
        OpCode::Gt => ">",
        OpCode::Le => "<=",
        _ => ">=",
    }
}

fn load_element(array: Value, index: Value) -> Result<Value, EvalError> {
    let items = match &array {
        Value::Array(array) => &array.items,
        Value::Null => {
            return Err(EvalError::NullReference {
                member: "[]".to_string(),
            });
        }
        other => {
            return Err(EvalError::OperandTypes {
                op: "[]",
                left: other.type_name(),
                right: index.type_name(),
            });
        }
    };
    let Value::Int32(i) = index else {
        return Err(EvalError::OperandTypes {
            op: "[]",
            left: array.type_name(),
            right: index.type_name(),
        });
    };
    usize::try_from(i)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(EvalError::IndexOutOfRange {
            index: i as i64,
            len: items.len(),
        })
}

/// Whether a value may be viewed as `ty`. Null is an instance of every
/// reference type.
fn is_instance_of(value: &Value, ty: TypeHash, env: &dyn Environment) -> bool {
    if value.is_null() || ty == primitives::OBJECT {
        return true;
    }
    let actual = value.type_hash();
    actual == ty || env.resolver().inheritance_distance(actual, ty).is_some()
}
