//! Statement execution.
//!
//! Statements report non-local control flow through [`Flow`] instead of
//! unwinding: every sequencing construct stops at the first non-normal
//! flow and hands it to its caller. Loops and switches consume `Break`;
//! function bodies consume `Return`.

use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{Interpreter, RED_ZONE, STACK_PER_RECURSION};
use crate::value::Value;
use tao_types::ast::*;

/// The control signal produced by executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Continue with the next statement.
    Normal,
    /// Leave the innermost loop or switch.
    Break,
    /// Leave the current function with a value.
    Return(Value),
}

impl Interpreter {
    /// Run a program in the global scope.
    ///
    /// Returns the value of the last top-level expression statement, or the
    /// value of a top-level `return`.
    pub fn run(&mut self, program: &Program) -> EvalResult<Value> {
        let globals = self.globals().clone();
        let mut completion = Value::Nil;
        for stmt in &program.stmts {
            if let Stmt::Expr(expr_stmt) = stmt {
                self.tick()?;
                completion = self.eval_expr(&expr_stmt.expr, &globals)?;
                continue;
            }
            match self.exec_stmt(stmt, &globals)? {
                Flow::Normal => {}
                Flow::Return(value) => return Ok(value),
                Flow::Break => {
                    return Err(
                        EvalError::generic("break outside of loop or switch").at(stmt.span())
                    );
                }
            }
        }
        Ok(completion)
    }

    /// Execute statements in order in `ctx`, stopping at the first
    /// non-normal flow.
    pub fn exec_stmts(&mut self, stmts: &[Stmt], ctx: &Context) -> EvalResult<Flow> {
        for stmt in stmts {
            let flow = self.exec_stmt(stmt, ctx)?;
            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Execute a block in a fresh child scope of `ctx`.
    pub fn exec_block(&mut self, block: &Block, ctx: &Context) -> EvalResult<Flow> {
        let scope = ctx.child();
        let flow = self.exec_stmts(&block.stmts, &scope);
        scope.reclaim();
        flow
    }

    /// Execute a single statement.
    pub fn exec_stmt(&mut self, stmt: &Stmt, ctx: &Context) -> EvalResult<Flow> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            self.tick()?;
            self.exec_kind(stmt, ctx)
        })
        .map_err(|e| e.at(stmt.span()))
    }

    fn exec_kind(&mut self, stmt: &Stmt, ctx: &Context) -> EvalResult<Flow> {
        match stmt {
            Stmt::Empty(_) => Ok(Flow::Normal),
            Stmt::Let(binding) => {
                let value = match &binding.value {
                    Some(expr) => self.eval_expr(expr, ctx)?,
                    None => Value::Nil,
                };
                ctx.define(binding.name.name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                self.eval_function(&decl.func, ctx);
                Ok(Flow::Normal)
            }
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr, ctx)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Block(block) => self.exec_block(block, ctx),
            Stmt::Expr(expr_stmt) => {
                self.eval_expr(&expr_stmt.expr, ctx)?;
                Ok(Flow::Normal)
            }
            Stmt::For(for_stmt) => self.exec_for(for_stmt, ctx),
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::If(if_stmt) => {
                if self.eval_expr(&if_stmt.condition, ctx)?.truth() {
                    self.exec_stmt(&if_stmt.then_branch, ctx)
                } else if let Some(else_branch) = &if_stmt.else_branch {
                    self.exec_stmt(else_branch, ctx)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Switch(switch) => self.exec_switch(switch, ctx),
        }
    }

    fn exec_for(&mut self, for_stmt: &ForStmt, ctx: &Context) -> EvalResult<Flow> {
        let scope = ctx.child();
        let flow = self.exec_loop(for_stmt, &scope);
        scope.reclaim();
        flow
    }

    /// Run `init` once, then iterate in the loop scope.
    fn exec_loop(&mut self, for_stmt: &ForStmt, scope: &Context) -> EvalResult<Flow> {
        if let Some(init) = &for_stmt.init {
            let flow = self.exec_stmt(init, scope)?;
            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }

        let mut iterations: u64 = 0;
        loop {
            // An empty body must still consume the step budget.
            self.tick()?;
            if let Some(condition) = &for_stmt.condition {
                if !self.eval_expr(condition, scope)?.truth() {
                    break;
                }
            }
            iterations += 1;
            match self.exec_block(&for_stmt.body, scope)? {
                Flow::Normal => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
            if let Some(update) = &for_stmt.update {
                self.eval_expr(update, scope)?;
            }
        }
        tracing::trace!(iterations, "for loop finished");
        Ok(Flow::Normal)
    }

    /// Run the first case whose test equals the subject, else the default
    /// case. There is no fall-through between cases.
    fn exec_switch(&mut self, switch: &SwitchStmt, ctx: &Context) -> EvalResult<Flow> {
        let subject = self.eval_expr(&switch.subject, ctx)?;

        let mut selected = None;
        for case in &switch.cases {
            if let Some(test) = &case.test {
                if self.eval_expr(test, ctx)? == subject {
                    selected = Some(case);
                    break;
                }
            }
        }
        let Some(case) = selected.or_else(|| switch.cases.iter().find(|c| c.test.is_none()))
        else {
            tracing::trace!(subject = %subject, "switch matched no case");
            return Ok(Flow::Normal);
        };

        let scope = ctx.child();
        let flow = self.exec_stmts(&case.body, &scope);
        scope.reclaim();
        match flow? {
            Flow::Break => Ok(Flow::Normal),
            flow => Ok(flow),
        }
    }
}
