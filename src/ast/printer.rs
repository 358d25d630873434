//! XML rendering of the declaration and scope structure of a program.
//!
//! Only declarations and scopes are rendered; expressions and plain
//! statements are skipped, while control-flow statements contribute the
//! scopes nested inside them.

use super::{
    ast::{Node, Program, Scope},
    declarations::{Declaration, FunctionDecl, VarDecl},
    statements::Stmt,
};

pub fn print_program(program: &Program) -> String {
    let mut printer = XmlPrinter::default();
    printer.line("<?xml version=\"1.0\"?>");
    printer.open("<Program>");
    printer.program(program);
    printer.close("</Program>");
    printer.output
}

#[derive(Default)]
struct XmlPrinter {
    output: String,
    depth: usize,
}

impl XmlPrinter {
    fn line(&mut self, text: &str) {
        self.output.push_str(&"  ".repeat(self.depth));
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Program(program) => self.program(program),
            Node::Declaration(declaration) => self.declaration(declaration),
            Node::Scope(scope) => self.scope(scope),
            Node::Statement(statement) => self.statement(statement),
            Node::Expression(_) => {}
        }
    }

    fn program(&mut self, program: &Program) {
        if let Some(left) = &program.left {
            self.node(left);
        }
        if let Some(right) = &program.right {
            self.node(right);
        }
    }

    fn declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Variable(variable) => self.variable(variable),
            Declaration::Function(function) => self.function(function),
        }
    }

    fn variable(&mut self, variable: &VarDecl) {
        self.line(&format!("<Variable id=\"{}\" />", variable.identifier));
    }

    fn function(&mut self, function: &FunctionDecl) {
        if function.parameters.is_empty() && function.body.is_none() {
            self.line(&format!("<Function id=\"{}\" />", function.identifier));
            return;
        }

        self.open(&format!("<Function id=\"{}\">", function.identifier));
        for parameter in &function.parameters {
            self.line(&format!("<Parameter id=\"{}\" />", parameter.identifier));
        }
        if let Some(body) = &function.body {
            self.scope(body);
        }
        self.close("</Function>");
    }

    fn scope(&mut self, scope: &Scope) {
        self.open("<Scope>");
        for declaration in &scope.declarations {
            self.variable(declaration);
        }
        for statement in &scope.statements {
            self.statement(statement);
        }
        self.close("</Scope>");
    }

    fn statement(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Sequence(statements) => {
                for statement in statements {
                    self.statement(statement);
                }
            }
            Stmt::Scope(scope) => self.scope(scope),
            Stmt::If(stmt) => self.statement(&stmt.then_branch),
            Stmt::IfElse(stmt) => {
                self.statement(&stmt.then_branch);
                self.statement(&stmt.else_branch);
            }
            Stmt::While(stmt) => self.scope(&stmt.body),
            Stmt::DoWhile(stmt) => self.scope(&stmt.body),
            Stmt::For(stmt) => self.scope(&stmt.body),
            Stmt::Expression(_) | Stmt::Assignment(_) | Stmt::Return(_) => {}
        }
    }
}
