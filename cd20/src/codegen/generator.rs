//! Tree walking code generator.
use std::convert::TryFrom;

use super::{CodeManager, Instruction, Operation};
use crate::{
    ast::{Node, NodeKind},
    constants::MAX_BYTE_OPERAND,
    error::{Cd20Error, Cd20Result},
    symbols::{Attribute, AttributeKind, BaseRegister, SymbolId, SymbolKind, SymbolTableManager},
    types::DataType,
};

/// Emits SM20 code for a parsed program.
///
/// Runs after parsing, over the symbol tables the parser filled in.
/// Every scope the parser created is re-entered by name.
pub struct Generator<'a> {
    symbols: &'a mut SymbolTableManager,
    code: CodeManager,
    /// Function being generated. `None` in main.
    function: Option<SymbolId>,
}

impl<'a> Generator<'a> {
    pub fn new(symbols: &'a mut SymbolTableManager) -> Self {
        Self {
            symbols,
            code: CodeManager::new(),
            function: None,
        }
    }

    /// Generate the whole program.
    ///
    /// The returned code manager still needs to build its module,
    /// which lays out the constant pool and resolves symbol loads.
    pub fn generate(mut self, root: &Node) -> Cd20Result<CodeManager> {
        self.gen_program(root)?;
        Ok(self.code)
    }

    #[inline(never)]
    #[cold]
    fn unexpected(&self, node: &Node, context: &str) -> Cd20Error {
        Cd20Error::internal(format!("unexpected {:?} node in {}", node.kind, context))
    }

    fn expect_symbol(&self, node: &Node) -> Cd20Result<SymbolId> {
        node.symbol
            .ok_or_else(|| Cd20Error::internal(format!("{:?} node without a symbol", node.kind)))
    }

    fn expect_child<'n>(&self, child: Option<&'n Node>, parent: &Node) -> Cd20Result<&'n Node> {
        child.ok_or_else(|| Cd20Error::internal(format!("{:?} node is missing a child", parent.kind)))
    }
}

/// Allocation
impl<'a> Generator<'a> {
    /// Hand the pooled literals to the code manager, which places them
    /// once the size of the code is known.
    fn register_constants(&mut self) {
        let constants: Vec<SymbolId> = self.symbols.constants().collect();
        for id in constants {
            let symbol = self.symbols.symbol(id);
            if let Some(Attribute::IntegerConstant(value)) = symbol.attribute(AttributeKind::IntegerConstant) {
                self.code.add_integer_constant(*value, id);
            } else if let Some(Attribute::FloatConstant(value)) = symbol.attribute(AttributeKind::FloatConstant) {
                self.code.add_float_constant(*value, id);
            } else if let Some(Attribute::StringConstant(value)) = symbol.attribute(AttributeKind::StringConstant) {
                self.code.add_string_constant(value.clone(), id);
            }
        }
    }

    /// Number of slots a scope occupies in the given region.
    ///
    /// Parameters are pushed by the caller and don't count.
    fn frame_size(&self, scope: &str, register: BaseRegister) -> usize {
        self.symbols
            .table(scope)
            .map(|table| {
                table
                    .symbols()
                    .map(|id| self.symbols.symbol(id))
                    .filter(|symbol| !symbol.is_parameter())
                    .filter(|symbol| symbol.storage().map(|s| s.register) == Some(register))
                    .count()
            })
            .unwrap_or(0)
    }

    /// `LB n` or `LH n` depending on size, then `ALLOC`.
    fn emit_alloc(&mut self, slots: usize) -> Cd20Result<()> {
        if slots == 0 {
            return Ok(());
        }
        self.emit_count(slots)?;
        self.code.insert_op(Operation::Alloc);
        Ok(())
    }

    fn emit_count(&mut self, count: usize) -> Cd20Result<()> {
        if count <= MAX_BYTE_OPERAND {
            self.code.insert(Instruction::with_operands(Operation::Lb, [count as u8]));
        } else {
            let half = i16::try_from(count)
                .map_err(|_| Cd20Error::internal(format!("count {} does not fit an operand", count)))?;
            self.code.insert(Instruction::with_operands(Operation::Lh, half.to_be_bytes()));
        }
        Ok(())
    }
}

/// Program structure
impl<'a> Generator<'a> {
    fn gen_program(&mut self, node: &Node) -> Cd20Result<()> {
        if node.kind != NodeKind::Program {
            return Err(self.unexpected(node, "program position"));
        }

        self.symbols.enter_scope("global")?;
        self.register_constants();

        let globals = self.frame_size("global", BaseRegister::Globals) + self.frame_size("main", BaseRegister::Globals);
        log::debug!("main frame: {} slot(s)", globals);
        self.emit_alloc(globals)?;

        if let Some(globals) = node.left() {
            self.gen_globals(globals)?;
        }

        let main = self.expect_child(node.right(), node)?;
        self.gen_main(main)?;
        self.code.insert_op(Operation::Halt);

        if let Some(functions) = node.centre() {
            for function in functions.items(NodeKind::Functions) {
                self.gen_function(function)?;
            }
        }

        self.symbols.leave_scope();
        Ok(())
    }

    /// Named constants are stored before main runs.
    ///
    /// Types and arrays declare no storage and emit nothing.
    fn gen_globals(&mut self, node: &Node) -> Cd20Result<()> {
        if let Some(inits) = node.left() {
            for init in inits.items(NodeKind::InitList) {
                let target = self.expect_symbol(init)?;
                let value = self.expect_child(init.left(), init)?;
                self.code.insert_backfill(Operation::PlaceholderLa, target);
                self.gen_expr(value)?;
                self.code.insert_op(Operation::St);
            }
        }
        Ok(())
    }

    fn gen_main(&mut self, node: &Node) -> Cd20Result<()> {
        self.symbols.enter_scope("main")?;
        if let Some(body) = node.right() {
            self.gen_statements(body)?;
        }
        self.symbols.leave_scope();
        Ok(())
    }

    fn gen_function(&mut self, node: &Node) -> Cd20Result<()> {
        let function = self.expect_symbol(node)?;
        let entry = self.jump_target(self.code.position())?;
        self.symbols
            .symbol_mut(function)
            .set_storage(BaseRegister::Constants, entry);

        let scope = format!("__function__{}", node.value_str());
        log::debug!("function {} at {}", scope, entry);
        self.symbols.enter_scope(&scope)?;

        let locals = self.frame_size(&scope, BaseRegister::Declarations);
        self.emit_alloc(locals)?;

        let outer = self.function.replace(function);
        let mut returns_last = false;
        if let Some(body) = node.right() {
            self.gen_statements(body)?;
            returns_last = body
                .items(NodeKind::Statements)
                .last()
                .map(|statement| statement.kind == NodeKind::Return)
                .unwrap_or(false);
        }
        if !returns_last {
            self.code.insert_op(Operation::Retn);
        }
        self.function = outer;

        self.symbols.leave_scope();
        Ok(())
    }
}

/// Statements
impl<'a> Generator<'a> {
    fn gen_statements(&mut self, node: &Node) -> Cd20Result<()> {
        for statement in node.items(NodeKind::Statements) {
            self.gen_statement(statement)?;
        }
        Ok(())
    }

    fn gen_statement(&mut self, node: &Node) -> Cd20Result<()> {
        use NodeKind as N;

        match node.kind {
            N::Assign | N::AddAssign | N::SubAssign | N::MulAssign | N::DivAssign => self.gen_assignment(node),
            N::For => self.gen_for(node),
            N::If | N::IfElse => self.gen_if(node),
            N::Repeat => self.gen_repeat(node),
            N::Input => self.gen_input(node),
            N::Print | N::Println => self.gen_print(node),
            N::Return => self.gen_return(node),
            N::CallStatement => self.gen_call(node),
            _ => Err(self.unexpected(node, "statement position")),
        }
    }

    fn gen_assignments(&mut self, node: Option<&Node>) -> Cd20Result<()> {
        if let Some(assignments) = node {
            for assignment in assignments.items(NodeKind::AssignList) {
                self.gen_assignment(assignment)?;
            }
        }
        Ok(())
    }

    /// `LA var; expr; ST`, or `LA var; LV var; expr; op; ST` when compound.
    fn gen_assignment(&mut self, node: &Node) -> Cd20Result<()> {
        let target = self.expect_symbol(node)?;
        let value = self.expect_child(node.right(), node)?;

        let op = match node.kind {
            NodeKind::Assign => None,
            NodeKind::AddAssign => Some(Operation::Add),
            NodeKind::SubAssign => Some(Operation::Sub),
            NodeKind::MulAssign => Some(Operation::Mul),
            NodeKind::DivAssign => Some(Operation::Div),
            _ => return Err(self.unexpected(node, "assignment position")),
        };

        self.code.insert_backfill(Operation::PlaceholderLa, target);
        if let Some(op) = op {
            self.code.insert_backfill(Operation::PlaceholderLv, target);
            self.gen_expr(value)?;
            self.code.insert_op(op);
        } else {
            self.gen_expr(value)?;
        }
        self.code.insert_op(Operation::St);
        Ok(())
    }

    /// ```text
    ///       LA0 else; cond; BF
    ///       then
    ///       LA0 end; BR
    /// else: otherwise
    /// end:
    /// ```
    fn gen_if(&mut self, node: &Node) -> Cd20Result<()> {
        self.symbols.enter_scope(node.value_str())?;

        let condition = self.expect_child(node.left(), node)?;
        let else_jump = self.emit_jump_placeholder();
        self.gen_expr(condition)?;
        self.code.insert_op(Operation::Bf);

        if let Some(body) = node.centre() {
            self.gen_statements(body)?;
        }

        if node.kind == NodeKind::IfElse {
            let end_jump = self.emit_jump_placeholder();
            self.code.insert_op(Operation::Br);

            self.patch_jump(else_jump, self.code.position())?;
            if let Some(otherwise) = node.right() {
                self.gen_statements(otherwise)?;
            }
            self.patch_jump(end_jump, self.code.position())?;
        } else {
            self.patch_jump(else_jump, self.code.position())?;
        }

        self.symbols.leave_scope();
        Ok(())
    }

    /// ```text
    ///      assignments
    /// top: LA0 end; cond; BF
    ///      body
    ///      LA0 top; BR
    /// end:
    /// ```
    fn gen_for(&mut self, node: &Node) -> Cd20Result<()> {
        self.symbols.enter_scope(node.value_str())?;

        self.gen_assignments(node.left())?;

        let top = self.code.position();
        let exit_jump = self.emit_jump_placeholder();
        let condition = self.expect_child(node.centre(), node)?;
        self.gen_expr(condition)?;
        self.code.insert_op(Operation::Bf);

        if let Some(body) = node.right() {
            self.gen_statements(body)?;
        }
        self.emit_jump(top)?;
        self.code.insert_op(Operation::Br);
        self.patch_jump(exit_jump, self.code.position())?;

        self.symbols.leave_scope();
        Ok(())
    }

    /// ```text
    ///      assignments
    /// top: body
    ///      LA0 top; cond; BF
    /// ```
    fn gen_repeat(&mut self, node: &Node) -> Cd20Result<()> {
        self.symbols.enter_scope(node.value_str())?;

        self.gen_assignments(node.left())?;

        let top = self.code.position();
        if let Some(body) = node.centre() {
            self.gen_statements(body)?;
        }
        self.emit_jump(top)?;
        let condition = self.expect_child(node.right(), node)?;
        self.gen_expr(condition)?;
        self.code.insert_op(Operation::Bf);

        self.symbols.leave_scope();
        Ok(())
    }

    fn gen_input(&mut self, node: &Node) -> Cd20Result<()> {
        let variables = self.expect_child(node.left(), node)?;
        for variable in variables.items(NodeKind::VariableList) {
            let target = self.expect_symbol(variable)?;
            let read = match self.symbols.value_type(target) {
                DataType::Int => Operation::Readi,
                DataType::Real => Operation::Readf,
                _ => return Err(self.unexpected(variable, "input position")),
            };
            self.code.insert_backfill(Operation::PlaceholderLa, target);
            self.code.insert_op(read);
            self.code.insert_op(Operation::St);
        }
        Ok(())
    }

    fn gen_print(&mut self, node: &Node) -> Cd20Result<()> {
        let entries = self.expect_child(node.left(), node)?;
        for entry in entries.items(NodeKind::PrintList) {
            if entry.kind == NodeKind::String {
                let string = self.expect_symbol(entry)?;
                self.code.insert_backfill(Operation::PlaceholderLa, string);
                self.code.insert_op(Operation::Strpr);
            } else {
                self.gen_expr(entry)?;
                self.code.insert_op(Operation::Valpr);
            }
        }

        if node.kind == NodeKind::Println {
            self.code.insert_op(Operation::Newln);
        }
        Ok(())
    }

    fn gen_return(&mut self, node: &Node) -> Cd20Result<()> {
        if self.function.is_none() {
            self.code.insert_op(Operation::Halt);
            return Ok(());
        }

        if let Some(value) = node.left() {
            self.gen_expr(value)?;
            self.code.insert_op(Operation::Rval);
        }
        self.code.insert_op(Operation::Retn);
        Ok(())
    }

    /// `[ZERO]; args reversed; LB argc; LA callee; JS2`
    ///
    /// The return slot is only pushed for functions that return a value.
    fn gen_call(&mut self, node: &Node) -> Cd20Result<()> {
        let function = self.expect_symbol(node)?;
        if self.symbols.symbol(function).kind != SymbolKind::Function {
            return Err(self.unexpected(node, "call position"));
        }

        if !self.symbols.value_type(function).is_void() {
            self.code.insert_op(Operation::Zero);
        }

        let args = node
            .left()
            .map(|args| args.items(NodeKind::ExpressionList))
            .unwrap_or_default();
        for arg in args.iter().rev() {
            self.gen_expr(arg)?;
        }

        self.emit_count(args.len())?;
        self.code.insert_backfill(Operation::PlaceholderLa, function);
        self.code.insert_op(Operation::Js2);
        Ok(())
    }
}

/// Expressions
impl<'a> Generator<'a> {
    fn gen_expr(&mut self, node: &Node) -> Cd20Result<()> {
        use NodeKind as N;

        match node.kind {
            N::IntLiteral | N::RealLiteral | N::Variable => {
                let symbol = self.expect_symbol(node)?;
                self.code.insert_backfill(Operation::PlaceholderLv, symbol);
            }
            N::True => {
                self.code.insert_op(Operation::True);
            }
            N::False => {
                self.code.insert_op(Operation::False);
            }
            N::Call => self.gen_call(node)?,
            N::Not => {
                let operand = self.expect_child(node.left(), node)?;
                self.gen_expr(operand)?;
                self.code.insert_op(Operation::Not);
            }
            N::And => self.gen_binary(node, Operation::And)?,
            N::Or => self.gen_binary(node, Operation::Or)?,
            N::Xor => self.gen_binary(node, Operation::Xor)?,
            N::Add => self.gen_binary(node, Operation::Add)?,
            N::Subtract => self.gen_binary(node, Operation::Sub)?,
            N::Multiply => self.gen_binary(node, Operation::Mul)?,
            N::Divide => self.gen_binary(node, Operation::Div)?,
            N::Modulo => self.gen_binary(node, Operation::Rem)?,
            N::Power => self.gen_binary(node, Operation::Pow)?,
            N::Equal | N::NotEqual | N::Greater | N::GreaterEq | N::Less | N::LessEq => self.gen_relation(node)?,
            _ => return Err(self.unexpected(node, "expression position")),
        }

        Ok(())
    }

    fn gen_binary(&mut self, node: &Node, op: Operation) -> Cd20Result<()> {
        let left = self.expect_child(node.left(), node)?;
        let right = self.expect_child(node.right(), node)?;
        self.gen_expr(left)?;
        self.gen_expr(right)?;
        self.code.insert_op(op);
        Ok(())
    }

    /// The machine only compares against zero.
    ///
    /// Numbers are subtracted first. Booleans are equal when their
    /// exclusive or is false.
    fn gen_relation(&mut self, node: &Node) -> Cd20Result<()> {
        let left = self.expect_child(node.left(), node)?;
        let operand_type = left
            .symbol
            .map(|id| self.symbols.value_type(id))
            .unwrap_or(DataType::Void);

        if operand_type.is_boolean() {
            self.gen_binary(node, Operation::Xor)?;
            match node.kind {
                NodeKind::Equal => {
                    self.code.insert_op(Operation::Not);
                }
                NodeKind::NotEqual => {}
                _ => return Err(self.unexpected(node, "boolean comparison")),
            }
            return Ok(());
        }

        let compare = match node.kind {
            NodeKind::Equal => Operation::Eq,
            NodeKind::NotEqual => Operation::Ne,
            NodeKind::Greater => Operation::Gt,
            NodeKind::GreaterEq => Operation::Ge,
            NodeKind::Less => Operation::Lt,
            NodeKind::LessEq => Operation::Le,
            _ => return Err(self.unexpected(node, "comparison position")),
        };
        self.gen_binary(node, Operation::Sub)?;
        self.code.insert_op(compare);
        Ok(())
    }
}

/// Jumps
impl<'a> Generator<'a> {
    fn jump_target(&self, position: usize) -> Cd20Result<i32> {
        i32::try_from(position).map_err(|_| Cd20Error::internal(format!("code position {} out of range", position)))
    }

    /// `LA0 0000` to be patched once the target is known.
    fn emit_jump_placeholder(&mut self) -> usize {
        self.code.insert(Instruction::with_operands(Operation::La0, [0; 4]))
    }

    /// `LA0 target` for an already known target.
    fn emit_jump(&mut self, target: usize) -> Cd20Result<usize> {
        let target = self.jump_target(target)?;
        Ok(self
            .code
            .insert(Instruction::with_operands(Operation::La0, target.to_be_bytes())))
    }

    fn patch_jump(&mut self, jump: usize, target: usize) -> Cd20Result<()> {
        let target = self.jump_target(target)?;
        self.code.patch_operands(jump, &target.to_be_bytes())
    }
}
