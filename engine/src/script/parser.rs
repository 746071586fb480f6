//! Recursive descent parser from tokens to a [`Node`] tree.
//!
//! Expressions are flattened to postfix while parsing: operands are emitted as they are read and
//! each operator follows its right operand, so `a + b * c` becomes `a b + c *`. Parentheses are
//! the only grouping; a parenthesized subexpression is inlined in place.

use crate::{
    ecs::value::Operator,
    script::{
        error::{Error, ErrorKind},
        node::{Node, NodeKind},
        token::{Keyword, Token, TokenKind},
    },
};

type Result<T> = std::result::Result<T, Error>;

/// Parse the tokens of one file into a `File` node.
pub fn parse(file: &str, tokens: Vec<Token>) -> Result<Node> {
    Parser::new(file, tokens).file()
}

struct Parser<'a> {
    file: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(file: &'a str, mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|token| token.is(TokenKind::Eof)) {
            let line = tokens.last().map_or(1, |token| token.line + 1);
            tokens.push(Token::new(TokenKind::Eof, "", line, 1));
        }
        Self {
            file,
            tokens,
            position: 0,
        }
    }

    // === Declarations === //

    fn file(mut self) -> Result<Node> {
        let mut file = Node::new(NodeKind::File, self.file, 1, 1);
        loop {
            let declaration = match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Keyword(Keyword::Component) => self.component()?,
                TokenKind::Keyword(Keyword::System) => self.system()?,
                TokenKind::Indent => {
                    return Err(self.error(self.peek(), ErrorKind::UnexpectedIndent));
                }
                _ => return Err(self.unexpected("`component` or `system`")),
            };
            file.children.push(declaration);
        }
        Ok(file)
    }

    fn component(&mut self) -> Result<Node> {
        let keyword = self.advance();
        let name = self.expect(TokenKind::Identifier, "component name")?;
        let mut component = declaration(NodeKind::ComponentDeclaration, &keyword, &name);

        match self.peek_kind() {
            TokenKind::Identifier => {
                component.children.push(self.type_name()?);
                self.expect(TokenKind::Newline, "end of line")?;
            }
            TokenKind::Colon | TokenKind::Newline => {
                self.eat(TokenKind::Colon);
                self.expect(TokenKind::Newline, "end of line")?;
                self.expect(TokenKind::Indent, "an indented property list")?;
                while !self.eat(TokenKind::Dedent) {
                    let ty = self.type_name()?;
                    let property = self.expect(TokenKind::Identifier, "property name")?;
                    if component
                        .children
                        .iter()
                        .any(|existing| existing.value == property.text)
                    {
                        return Err(self.error(
                            &property,
                            ErrorKind::DuplicateProperty(property.text.clone()),
                        ));
                    }
                    self.expect(TokenKind::Newline, "end of line")?;
                    component
                        .children
                        .push(node(NodeKind::Property, &property).with_child(ty));
                }
            }
            _ => return Err(self.unexpected("a type or a property block")),
        }
        Ok(component)
    }

    fn type_name(&mut self) -> Result<Node> {
        let ty = self.expect(TokenKind::Identifier, "type name")?;
        Ok(node(NodeKind::Type, &ty))
    }

    fn system(&mut self) -> Result<Node> {
        let keyword = self.advance();
        let name = self.expect(TokenKind::Identifier, "system name")?;
        let mut system = declaration(NodeKind::SystemDeclaration, &keyword, &name);

        self.expect(TokenKind::OpenParen, "`(`")?;
        system.children.push(self.entity_parameter(false)?);
        self.expect(TokenKind::CloseParen, "`)`")?;

        if self.eat(TokenKind::Keyword(Keyword::Event)) {
            system.children.push(self.event()?);
        }
        self.eat(TokenKind::Colon);
        self.expect(TokenKind::Newline, "end of line")?;
        system.children.push(self.block()?);
        Ok(system)
    }

    /// `name<Component, ...>`.
    fn entity_parameter(&mut self, allow_empty: bool) -> Result<Node> {
        let name = self.expect(TokenKind::Identifier, "entity parameter")?;
        let mut parameter = node(NodeKind::EntityParameter, &name);
        self.expect(TokenKind::Operator(Operator::Lt), "`<`")?;
        if !(allow_empty && self.peek_kind() == TokenKind::Operator(Operator::Gt)) {
            loop {
                let component = self.expect(TokenKind::Identifier, "component name")?;
                parameter
                    .children
                    .push(node(NodeKind::Identifier, &component));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::Operator(Operator::Gt), "`>`")?;
        Ok(parameter)
    }

    /// `Name` or `Name(Type payload, group<Component>, ...)`.
    fn event(&mut self) -> Result<Node> {
        let name = self.expect(TokenKind::Identifier, "event name")?;
        let mut event = node(NodeKind::EventDeclaration, &name);
        if !self.eat(TokenKind::OpenParen) || self.eat(TokenKind::CloseParen) {
            return Ok(event);
        }
        loop {
            if self.peek_kind_at(1) == TokenKind::Operator(Operator::Lt) {
                event.children.push(self.entity_parameter(true)?);
            } else if event.child(NodeKind::Payload).is_some() {
                return Err(self.unexpected("an entity group"));
            } else {
                let ty = self.type_name()?;
                let payload = self.expect(TokenKind::Identifier, "payload name")?;
                event
                    .children
                    .push(node(NodeKind::Payload, &payload).with_child(ty));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "`)`")?;
        Ok(event)
    }

    // === Statements === //

    fn block(&mut self) -> Result<Node> {
        let indent = self.expect(TokenKind::Indent, "an indented block")?;
        let mut block = node(NodeKind::Block, &indent);
        while !self.eat(TokenKind::Dedent) {
            if self.peek_kind() == TokenKind::Eof {
                return Err(self.unexpected("statement"));
            }
            block.children.push(self.statement()?);
        }
        Ok(block)
    }

    fn statement(&mut self) -> Result<Node> {
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Pass) => {
                let pass = self.advance();
                self.expect(TokenKind::Newline, "end of line")?;
                Ok(node(NodeKind::Pass, &pass))
            }
            TokenKind::Keyword(Keyword::If) => self.if_statement(),
            TokenKind::Keyword(Keyword::While) => {
                let keyword = self.advance();
                let condition = self.expression()?;
                let body = self.header_block()?;
                Ok(node(NodeKind::While, &keyword)
                    .with_child(condition)
                    .with_child(body))
            }
            TokenKind::Identifier if self.peek_kind_at(1) == TokenKind::OpenParen => {
                let call = self.call()?;
                self.expect(TokenKind::Newline, "end of line")?;
                Ok(call)
            }
            TokenKind::Identifier => {
                let target = self.path()?;
                let assign = self.expect(TokenKind::Assign, "`=`")?;
                let value = self.expression()?;
                self.expect(TokenKind::Newline, "end of line")?;
                Ok(
                    Node::new(NodeKind::Assignment, assign.text, target.line, target.column)
                        .with_child(target)
                        .with_child(value),
                )
            }
            TokenKind::Indent => Err(self.error(self.peek(), ErrorKind::UnexpectedIndent)),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn if_statement(&mut self) -> Result<Node> {
        let keyword = self.advance();
        let condition = self.expression()?;
        let body = self.header_block()?;
        let mut statement = node(NodeKind::If, &keyword)
            .with_child(condition)
            .with_child(body);

        if self.peek_kind() == TokenKind::Keyword(Keyword::Else) {
            let keyword = self.advance();
            let body = if self.peek_kind() == TokenKind::Keyword(Keyword::If) {
                let nested = self.if_statement()?;
                Node::new(NodeKind::Block, "", nested.line, nested.column).with_child(nested)
            } else {
                self.header_block()?
            };
            statement
                .children
                .push(node(NodeKind::Else, &keyword).with_child(body));
        }
        Ok(statement)
    }

    /// The rest of an `if`, `else` or `while` line and the block under it.
    fn header_block(&mut self) -> Result<Node> {
        self.eat(TokenKind::Colon);
        self.expect(TokenKind::Newline, "end of line")?;
        self.block()
    }

    fn call(&mut self) -> Result<Node> {
        let name = self.advance();
        let mut call = node(NodeKind::Call, &name);
        self.expect(TokenKind::OpenParen, "`(`")?;
        if !self.eat(TokenKind::CloseParen) {
            loop {
                call.children.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseParen, "`)`")?;
        }
        Ok(call)
    }

    fn path(&mut self) -> Result<Node> {
        let first = self.expect(TokenKind::Identifier, "name")?;
        let mut path = node(NodeKind::Path, &first);
        path.children.push(node(NodeKind::Identifier, &first));
        while self.eat(TokenKind::Dot) {
            let member = self.expect(TokenKind::Identifier, "member name")?;
            path.value.push('.');
            path.value.push_str(&member.text);
            path.children.push(node(NodeKind::Identifier, &member));
        }
        Ok(path)
    }

    // === Expressions === //

    fn expression(&mut self) -> Result<Node> {
        let start = self.peek().clone();
        let mut expression = Node::new(NodeKind::Expression, "", start.line, start.column);
        self.operand(&mut expression.children)?;
        while let TokenKind::Operator(_) = self.peek_kind() {
            let operator = self.advance();
            self.operand(&mut expression.children)?;
            expression
                .children
                .push(node(NodeKind::Operator, &operator));
        }
        Ok(expression)
    }

    fn operand(&mut self, out: &mut Vec<Node>) -> Result<()> {
        let kind = match self.peek_kind() {
            TokenKind::Number => NodeKind::Number,
            TokenKind::Integer => NodeKind::Integer,
            TokenKind::String => NodeKind::String,
            TokenKind::Keyword(Keyword::True | Keyword::False) => NodeKind::Boolean,
            TokenKind::OpenParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::CloseParen, "`)`")?;
                out.extend(inner.children);
                return Ok(());
            }
            TokenKind::Identifier if self.peek_kind_at(1) == TokenKind::OpenParen => {
                out.push(self.call()?);
                return Ok(());
            }
            TokenKind::Identifier => {
                out.push(self.path()?);
                return Ok(());
            }
            _ => return Err(self.unexpected("expression")),
        };
        let literal = self.advance();
        out.push(node(kind, &literal));
        Ok(())
    }

    // === Token cursor === //

    fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !token.is(TokenKind::Eof) {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        let matched = self.peek_kind() == kind;
        if matched {
            self.advance();
        }
        matched
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = self.peek();
        self.error(
            found,
            ErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: found.describe(),
            },
        )
    }

    fn error(&self, at: &Token, kind: ErrorKind) -> Error {
        Error::new(self.file, at.line, at.column, kind)
    }
}

fn node(kind: NodeKind, token: &Token) -> Node {
    Node::new(kind, token.text.clone(), token.line, token.column)
}

/// A declaration node positioned at its keyword, valued with its name.
fn declaration(kind: NodeKind, keyword: &Token, name: &Token) -> Node {
    Node::new(kind, name.text.clone(), keyword.line, keyword.column)
}
