pub mod builtins;
pub mod evaluator;
pub mod simulator;

use crate::dsl;
use crate::dsl::token::Token;
use crate::error::CommandError;
use crate::registry::Registry;
use crate::settings::ConsoleSettings;
use crate::sink::{LogLevel, PresentationSink};
use crate::value::Value;

pub use simulator::Simulation;

/// The console context: registry, settings and output sink, owned by the host.
///
/// At most one `execute`/`simulate` runs at a time; the host serialises input.
pub struct Engine {
    registry: Registry,
    settings: ConsoleSettings,
    sink: Box<dyn PresentationSink>,
}

impl Engine {
    pub fn new(registry: Registry, settings: ConsoleSettings, sink: impl PresentationSink + 'static) -> Self {
        Self {
            registry,
            settings,
            sink: Box::new(sink),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    pub fn emit(&mut self, text: &str, level: LogLevel) {
        self.sink.emit(text, level);
    }

    pub fn is_ready(&self) -> bool {
        self.registry.is_enabled()
    }

    /// Source line to postfix tokens, using the configured symbols.
    pub fn compile(&self, source: &str) -> Option<Vec<Token>> {
        dsl::compile(source, &self.settings.symbols)
    }

    /// Evaluate postfix tokens.
    ///
    /// On success the result is stored in the last-result global, and a
    /// result that is neither null nor a string is shown through the best
    /// matching presenter.
    pub fn execute(&mut self, postfix: &[Token]) -> Result<Value, CommandError> {
        if !self.registry.is_enabled() {
            return Err(CommandError::NotReady);
        }
        let result = evaluator::evaluate(self, postfix)?;

        let last = self.settings.last_result.clone();
        self.registry.set_global(&last, result.clone());

        if !result.is_null() && !matches!(result, Value::String(_)) {
            if let Some(presenter) = self.registry.presenter_for(&result) {
                presenter.invoke(&result, self.registry.types(), self.sink.as_mut());
            }
        }
        Ok(result)
    }

    /// Compile and execute one line. Unbalanced brackets or empty input are
    /// an invalid command.
    pub fn run(&mut self, source: &str) -> Result<Value, CommandError> {
        if !self.registry.is_enabled() {
            return Err(CommandError::NotReady);
        }
        let postfix = self.compile(source).ok_or(CommandError::InvalidCommand)?;
        self.execute(&postfix)
    }

    /// Run a line the way the console does and present the outcome: a
    /// non-null result is echoed quoted; a failure echoes the raw input and
    /// then the message, both as exceptions. Blank lines are ignored.
    pub fn submit(&mut self, source: &str) -> Result<Value, CommandError> {
        if source.trim().is_empty() {
            return Ok(Value::Null);
        }
        match self.run(source) {
            Ok(result) => {
                if !result.is_null() {
                    self.emit(&format!("'{result}'"), LogLevel::Log);
                }
                Ok(result)
            }
            Err(e) => {
                tracing::debug!("command failed: {e}");
                self.emit(source, LogLevel::Exception);
                self.emit(&e.to_string(), LogLevel::Exception);
                Err(e)
            }
        }
    }

    /// Which command and argument slot the cursor is in. None while the
    /// registry is not ready or when there is nothing to hint.
    pub fn simulate(&self, source: &str, cursor: usize) -> Option<Simulation> {
        if !self.registry.is_enabled() {
            return None;
        }
        let tokens = dsl::token::tokenize(dsl::lexer::lex_with(source, &self.settings.symbols));
        simulator::simulate(&self.registry, &tokens, cursor)
    }

    /// Syntax hint for the command under the cursor, current slot in brackets.
    pub fn hint(&self, source: &str, cursor: usize) -> Option<String> {
        let sim = self.simulate(source, cursor)?;
        Some(sim.command.syntax_hint(sim.slot, self.registry.types()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sink::SharedLog;

    fn engine() -> (Engine, SharedLog) {
        let log = SharedLog::new(32);
        let mut registry = Registry::new();
        registry.set_enabled(true);
        (Engine::new(registry, ConsoleSettings::default(), log.clone()), log)
    }

    #[test]
    fn not_ready_until_enabled() {
        let mut engine = Engine::new(Registry::new(), ConsoleSettings::default(), SharedLog::new(4));
        assert!(matches!(engine.run("help"), Err(CommandError::NotReady)));
        assert!(engine.simulate("help", 1).is_none());
        engine.registry_mut().set_enabled(true);
        assert!(engine.run("help").is_ok());
    }

    #[test]
    fn result_is_stored_for_chaining() {
        let (mut engine, _) = engine();
        engine.run("'first'").unwrap();
        assert_eq!(engine.run("@").unwrap(), Value::from("first"));
        assert_eq!(engine.run("@.'!'").unwrap(), Value::from("first!"));
    }

    #[test]
    fn custom_last_result_name() {
        let settings = ConsoleSettings {
            last_result: "last".to_string(),
            ..ConsoleSettings::default()
        };
        let mut registry = Registry::new();
        registry.set_enabled(true);
        let mut engine = Engine::new(registry, settings, SharedLog::new(4));
        engine.run("'x'").unwrap();
        assert_eq!(engine.run("@last").unwrap(), Value::from("x"));
    }

    #[test]
    fn submit_echoes_results_and_errors() {
        let (mut engine, log) = engine();
        engine.submit("echo 'hi'").unwrap();
        engine.submit("echo $missing").unwrap_err();
        let entries = log.drain();
        let texts: Vec<(&str, LogLevel)> = entries.iter().map(|e| (e.text.as_str(), e.level)).collect();
        assert_eq!(
            texts,
            vec![
                ("'hi'", LogLevel::Log),
                ("echo $missing", LogLevel::Exception),
                ("Unknown variable 'missing'", LogLevel::Exception),
            ]
        );
    }

    #[test]
    fn unbalanced_input_is_invalid_command() {
        let (mut engine, log) = engine();
        let err = engine.submit("echo 'a'}").unwrap_err();
        assert!(matches!(err, CommandError::InvalidCommand));
        assert_eq!(log.snapshot().last().unwrap().text, "Invalid command");
        assert!(engine.submit("   ").unwrap().is_null());
    }

    #[test]
    fn non_string_results_are_presented() {
        let (mut engine, log) = engine();
        engine.registry_mut().set_variable("list", Value::from(vec![1_i64, 2]));
        engine.submit("$list").unwrap();
        let texts: Vec<String> = log.drain().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["list (2 items)\n  [0] 1\n  [1] 2", "'[1, 2]'"]);
    }

    #[test]
    fn hint_marks_current_slot() {
        let (engine, _) = engine();
        assert_eq!(engine.hint("setvar 'x' ", 8).unwrap(), "setvar [name:string] value:object");
        assert_eq!(engine.hint("echo", 2).unwrap(), "[echo] value:object");
        assert!(engine.hint("ech", 3).is_none());
    }
}
