//! Expression parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ExprError;
use crate::expr::ast::{BinaryOp, Expr};
use crate::expr::lexer::Token;

/// Parse an attribute value expression into an AST
pub fn parse(input: &str) -> Result<Expr, Vec<ExprError>> {
    let len = input.len();

    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for (tok, span) in crate::expr::lexer::lex(input) {
        match tok {
            Ok(tok) => tokens.push((tok, SimpleSpan::from(span))),
            Err(()) => errors.push(ExprError::syntax(
                span.clone(),
                format!("Unexpected character '{}'", &input[span]),
            )),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let token_stream =
        Stream::from_iter(tokens.into_iter()).map((len..len).into(), |(t, s): (_, _)| (t, s));

    expr_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let expr = recursive(|expr| {
        let atom = choice((
            select! {
                Token::Number(n) => Expr::Number(n),
                Token::Ident(s) => Expr::Symbol(s),
            },
            expr.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        ));

        // Any run of prefix signs: `-x`, `--x`, `+-x`
        let unary = choice((just(Token::Minus).to(true), just(Token::Plus).to(false)))
            .repeated()
            .collect::<Vec<_>>()
            .then(atom)
            .map(|(signs, atom)| {
                signs
                    .into_iter()
                    .rev()
                    .fold(atom, |acc, negate| if negate { Expr::neg(acc) } else { acc })
            });

        let product_op = choice((
            just(Token::Star).to(BinaryOp::Mul),
            just(Token::Slash).to(BinaryOp::Div),
        ));
        let product = unary
            .clone()
            .then(product_op.then(unary).repeated().collect::<Vec<_>>())
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |lhs, (op, rhs)| Expr::binary(op, lhs, rhs))
            });

        let sum_op = choice((
            just(Token::Plus).to(BinaryOp::Add),
            just(Token::Minus).to(BinaryOp::Sub),
        ));
        product
            .clone()
            .then(sum_op.then(product).repeated().collect::<Vec<_>>())
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |lhs, (op, rhs)| Expr::binary(op, lhs, rhs))
            })
    });

    expr.then_ignore(end())
}
