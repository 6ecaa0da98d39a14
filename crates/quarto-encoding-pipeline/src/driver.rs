/*
 * driver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The producer lifecycle driver.
//!
//! [`run`] takes one producer invocation from start to finish:
//!
//! 1. Resolve the container: the parent context's type, or for the
//!    outermost producer the response type (validated afresh unless the
//!    host sink already validates it).
//! 2. Select how the producer's output reaches the container and install
//!    the producer's own context for anything nested inside it.
//! 3. Run the body under the producer's [`Discipline`].
//! 4. Write framing, finish every encoder and validator that was created,
//!    and restore the parent context.
//!
//! The parent context is restored on every exit path, and each encoder or
//! validator the driver creates is finished exactly once, including when
//! the invocation fails part way.

use quarto_encoding::{
    BufferResult, BufferWriter, FailOnWrite, MediaEncoder, MediaSink, MediaType, MediaValidator,
    NullSink, ValidMediaInput,
};
use tracing::{debug, trace};

use crate::context::{self, EncodingHost, RequestContext};
use crate::error::{PipelineError, Result};
use crate::producer::{Body, BodyControl, Discipline, EndControl, LifecyclePhase, Producer};
use crate::select::{self, OutputMode, Selection};

/// Run one producer invocation, writing into `out`.
///
/// `out` must be the sink belonging to the current context, or the host's
/// raw sink when there is no current context.
pub fn run(
    producer: &mut dyn Producer,
    body: Option<&mut dyn Body>,
    host: &mut dyn EncodingHost,
    out: &mut dyn MediaSink,
) -> Result<EndControl> {
    let parent = context::current(host);
    let discipline = producer.discipline();
    trace!(?discipline, parent = ?parent.map(|c| c.content_type), "run producer");
    let result = run_invocation(parent, host, out, |invocation, host, out| match discipline {
        Discipline::Filtered => invocation.filtered(producer, body, host, out),
        Discipline::Buffered => invocation.deferred(producer, body, Deferred::Capture, host, out),
        Discipline::Discarding => {
            invocation.deferred(producer, body, Deferred::Discard, host, out)
        }
    });
    host.set_current_context(parent);
    result
}

fn run_invocation(
    parent: Option<RequestContext>,
    host: &mut dyn EncodingHost,
    out: &mut dyn MediaSink,
    f: impl FnOnce(&mut Invocation, &mut dyn EncodingHost, &mut dyn MediaSink) -> Result<EndControl>,
) -> Result<EndControl> {
    let mut invocation = Invocation::resolve(parent, host, out)?;
    let result = f(&mut invocation, host, out);
    if result.is_err() {
        invocation.abort(out);
    }
    result
}

/// Where a deferred producer's body output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Captured and validated against the content type.
    Capture,
    /// Dropped under the discard context.
    Discard,
}

/// Lifecycle states of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    PrefixWritten,
    BodyRunning,
    SuffixWritten,
    End,
    Aborted,
}

/// The container a producer writes into.
#[derive(Debug)]
struct Container {
    media_type: MediaType,
    /// Present only for an outermost producer whose sink does not already
    /// validate the container type.
    validator: Option<MediaValidator>,
}

/// The resolved path from the producer to its container.
#[derive(Debug)]
enum Target {
    NoOutput,
    PassThrough,
    Encode(MediaEncoder),
    Validate(MediaValidator),
    /// The encoder or validator has received its terminating call.
    Finished,
}

#[derive(Debug)]
struct Output {
    media_type: Option<MediaType>,
    mode: OutputMode,
    /// Installed while the producer or its body writes.
    context: Option<RequestContext>,
    target: Target,
}

#[derive(Debug)]
struct Invocation {
    parent: Option<RequestContext>,
    phase: Phase,
    container: Container,
    output: Option<Output>,
}

impl Invocation {
    fn resolve(
        parent: Option<RequestContext>,
        host: &dyn EncodingHost,
        out: &dyn MediaSink,
    ) -> Result<Self> {
        let container = match parent {
            Some(parent) => {
                debug!(container_type = %parent.content_type, "container type from parent context");
                debug_assert!(
                    parent
                        .valid_input
                        .accepts_without_extra_work(parent.content_type),
                    "parent context does not validate its own content type"
                );
                Container {
                    media_type: parent.content_type,
                    validator: None,
                }
            }
            None => {
                let media_type = context::resolve_container_type(host)?;
                let skip_validation = out
                    .valid_media_input()
                    .is_some_and(|g| g.can_skip_validation(media_type));
                debug!(container_type = %media_type, skip_validation, "outermost container");
                Container {
                    media_type,
                    validator: (!skip_validation).then(|| MediaValidator::new(media_type)),
                }
            }
        };
        Ok(Self {
            parent,
            phase: Phase::Start,
            container,
            output: None,
        })
    }

    fn filtered(
        &mut self,
        producer: &mut dyn Producer,
        mut body: Option<&mut dyn Body>,
        host: &mut dyn EncodingHost,
        out: &mut dyn MediaSink,
    ) -> Result<EndControl> {
        let container_type = self.container.media_type;
        self.with_container_sink(out, |sink| producer.write_prefix(container_type, sink))?;
        self.advance(Phase::PrefixWritten);

        let content_type = producer.content_type();
        self.update_output(producer, Some(content_type), true, out)?;
        self.install_context(host);
        let control = self.with_sink(out, |sink| producer.start(sink))?;
        match control {
            BodyControl::Skip => {}
            BodyControl::Eval => loop {
                self.advance(Phase::BodyRunning);
                if let Some(body) = body.as_deref_mut() {
                    self.invoke_body(body, host, out)?;
                }
                let content_type = producer.content_type();
                self.update_output(producer, Some(content_type), true, out)?;
                self.install_context(host);
                let captured = BufferResult::empty();
                match self.with_sink(out, |sink| producer.after_body(&captured, sink))? {
                    BodyControl::Skip => break,
                    BodyControl::EvalAgain => {}
                    control => return Err(invalid_return(LifecyclePhase::AfterBody, control)),
                }
            },
            control => return Err(invalid_return(LifecyclePhase::Start, control)),
        }

        let content_type = producer.content_type();
        self.finish(
            producer,
            Some(content_type),
            true,
            &BufferResult::empty(),
            true,
            host,
            out,
        )
    }

    /// Buffered and discarding producers: the body never streams, so the
    /// output type is re-read after every run and only fixed at the end.
    fn deferred(
        &mut self,
        producer: &mut dyn Producer,
        mut body: Option<&mut dyn Body>,
        deferred: Deferred,
        host: &mut dyn EncodingHost,
        out: &mut dyn MediaSink,
    ) -> Result<EndControl> {
        let container_type = self.container.media_type;
        let output_type = producer.output_type();
        let write_prefix_suffix = output_type.is_some();
        if write_prefix_suffix {
            self.with_container_sink(out, |sink| producer.write_prefix(container_type, sink))?;
        }
        self.advance(Phase::PrefixWritten);

        self.update_output(producer, output_type, false, out)?;
        self.install_context(host);
        let mut captured = BufferResult::empty();
        let control = self.with_sink(out, |sink| producer.start(sink))?;
        match control {
            BodyControl::Skip => {}
            BodyControl::Eval => loop {
                self.advance(Phase::BodyRunning);
                match deferred {
                    Deferred::Capture => captured = capture(producer, body.as_deref_mut(), host)?,
                    Deferred::Discard => discard(body.as_deref_mut(), host)?,
                }
                let output_type = producer.output_type();
                self.update_output(producer, output_type, false, out)?;
                self.install_context(host);
                match self.with_sink(out, |sink| producer.after_body(&captured, sink))? {
                    BodyControl::Skip => break,
                    BodyControl::EvalAgain => {}
                    control => return Err(invalid_return(LifecyclePhase::AfterBody, control)),
                }
            },
            control => return Err(invalid_return(LifecyclePhase::Start, control)),
        }

        let output_type = producer.output_type();
        self.finish(
            producer,
            output_type,
            false,
            &captured,
            write_prefix_suffix,
            host,
            out,
        )
    }

    /// The end of every discipline: the producer's own output, then the
    /// closing framing from the inside out.
    fn finish(
        &mut self,
        producer: &mut dyn Producer,
        output_type: Option<MediaType>,
        stable_mode: bool,
        captured: &BufferResult,
        write_suffix: bool,
        host: &mut dyn EncodingHost,
        out: &mut dyn MediaSink,
    ) -> Result<EndControl> {
        self.update_output(producer, output_type, stable_mode, out)?;
        self.install_context(host);
        let control = self.with_sink(out, |sink| producer.end(captured, sink))?;
        self.finish_output(out)?;
        self.advance(Phase::SuffixWritten);
        if write_suffix {
            let container_type = self.container.media_type;
            self.with_container_sink(out, |sink| producer.write_suffix(container_type, sink))?;
        }
        self.finish_container(out)?;
        self.advance(Phase::End);
        Ok(control)
    }

    /// Select the output path for `new_type`, replacing the current one
    /// when the type has changed.
    ///
    /// With `stable_mode`, a change that crosses between buffered and
    /// unbuffered modes is rejected: output has already streamed through
    /// the old path and cannot be rewrapped.
    fn update_output(
        &mut self,
        producer: &mut dyn Producer,
        new_type: Option<MediaType>,
        stable_mode: bool,
        out: &mut dyn MediaSink,
    ) -> Result<()> {
        if self
            .output
            .as_ref()
            .is_some_and(|output| output.media_type == new_type)
        {
            return Ok(());
        }

        let selection = select::select(
            new_type,
            self.container.media_type,
            self.parent.map(|c| c.valid_input),
        );
        let new_mode = selection.mode();
        if let Some(previous) = &self.output {
            debug!(
                from = ?previous.media_type,
                from_mode = %previous.mode,
                to = ?new_type,
                to_mode = %new_mode,
                "changing output type"
            );
            if stable_mode && previous.mode.is_buffered() != new_mode.is_buffered() {
                if let (Some(previous_type), Some(new_type)) = (previous.media_type, new_type) {
                    return Err(PipelineError::IncompatibleBufferingMode {
                        previous_type,
                        previous_mode: previous.mode,
                        new_type,
                        new_mode,
                    });
                }
            }
            self.finish_output(out)?;
        }

        let (target, context) = match selection {
            Selection::NoOutput => (Target::NoOutput, self.parent),
            Selection::Encode(mut encoder) => {
                producer.configure_encoder(&mut encoder);
                self.with_container_sink(out, |sink| Ok(encoder.write_prefix_to(sink)?))?;
                let context = RequestContext::validating(encoder.input_type());
                (Target::Encode(encoder), Some(context))
            }
            Selection::PassThrough(guarantee) => (
                Target::PassThrough,
                new_type.map(|t| RequestContext::new(t, guarantee)),
            ),
            Selection::Validate(validator) => {
                let context = RequestContext::validating(validator.media_type());
                (Target::Validate(validator), Some(context))
            }
        };
        self.output = Some(Output {
            media_type: new_type,
            mode: new_mode,
            context,
            target,
        });
        Ok(())
    }

    /// Give the current encoder or validator its terminating call.
    fn finish_output(&mut self, out: &mut dyn MediaSink) -> Result<()> {
        let Some(output) = self.output.as_mut() else {
            return Ok(());
        };
        let trim = output.media_type.is_some_and(MediaType::trim_buffer);
        match std::mem::replace(&mut output.target, Target::Finished) {
            Target::Encode(mut encoder) => {
                self.with_container_sink(out, |sink| Ok(encoder.write_suffix_to(sink, trim)?))
            }
            Target::Validate(mut validator) => {
                self.with_container_sink(out, |sink| Ok(validator.validate(trim, sink)?))
            }
            Target::NoOutput | Target::PassThrough | Target::Finished => Ok(()),
        }
    }

    fn finish_container(&mut self, out: &mut dyn MediaSink) -> Result<()> {
        if let Some(mut validator) = self.container.validator.take() {
            validator.validate(false, out)?;
        }
        Ok(())
    }

    /// Terminate whatever is still open after a failure. Errors raised
    /// here are logged and dropped in favor of the original one.
    fn abort(&mut self, out: &mut dyn MediaSink) {
        debug!(phase = ?self.phase, "producer failed");
        self.phase = Phase::Aborted;
        if let Err(e) = self.finish_output(out) {
            debug!(error = %e, "error finishing output after failure");
        }
        if let Err(e) = self.finish_container(out) {
            debug!(error = %e, "error finishing container after failure");
        }
    }

    fn advance(&mut self, phase: Phase) {
        trace!(from = ?self.phase, to = ?phase, "producer phase");
        self.phase = phase;
    }

    fn install_context(&self, host: &mut dyn EncodingHost) {
        if let Some(output) = &self.output {
            host.set_current_context(output.context);
        }
    }

    /// Run the body into the producer's sink. Bodies that opt out of
    /// streaming are collected first and written once they return.
    fn invoke_body(
        &mut self,
        body: &mut dyn Body,
        host: &mut dyn EncodingHost,
        out: &mut dyn MediaSink,
    ) -> Result<()> {
        let buffered = self
            .output
            .as_ref()
            .is_some_and(|output| output.mode.is_buffered());
        if !buffered || body.try_bypass_buffering() {
            return self.with_sink(out, |sink| body.invoke(sink, host));
        }
        let mut buffer = String::new();
        body.invoke(&mut buffer, host)?;
        if buffer.is_empty() {
            return Ok(());
        }
        trace!(len = buffer.len(), "writing collected body");
        self.with_sink(out, |sink| Ok(sink.write_str(&buffer)?))
    }

    /// Call `f` with the sink the producer writes to.
    fn with_sink<R>(
        &mut self,
        out: &mut dyn MediaSink,
        f: impl FnOnce(&mut dyn MediaSink) -> Result<R>,
    ) -> Result<R> {
        let Invocation {
            container, output, ..
        } = self;
        let Some(output) = output.as_mut() else {
            return f(&mut FailOnWrite);
        };
        match container.validator.as_mut() {
            Some(validator) => with_target(&mut output.target, &mut validator.writer(out), f),
            None => with_target(&mut output.target, out, f),
        }
    }

    /// Call `f` with the sink for the container itself.
    fn with_container_sink<R>(
        &mut self,
        out: &mut dyn MediaSink,
        f: impl FnOnce(&mut dyn MediaSink) -> Result<R>,
    ) -> Result<R> {
        match self.container.validator.as_mut() {
            Some(validator) => f(&mut validator.writer(out)),
            None => f(out),
        }
    }
}

fn with_target<R>(
    target: &mut Target,
    out: &mut dyn MediaSink,
    f: impl FnOnce(&mut dyn MediaSink) -> Result<R>,
) -> Result<R> {
    match target {
        Target::PassThrough => f(out),
        Target::Encode(encoder) => f(&mut encoder.writer(out)),
        Target::Validate(validator) => f(&mut validator.writer(out)),
        Target::NoOutput | Target::Finished => f(&mut FailOnWrite),
    }
}

/// Capture one run of a buffered producer's body, validated against its
/// content type as it is written.
fn capture<'b>(
    producer: &mut dyn Producer,
    body: Option<&mut (dyn Body + 'b)>,
    host: &mut dyn EncodingHost,
) -> Result<BufferResult> {
    let content_type = producer.content_type();
    let mut buffer = BufferWriter::new(producer.temp_file_threshold(host.config()));
    let mut validator = MediaValidator::new(content_type);
    host.set_current_context(Some(RequestContext::validating(content_type)));

    let result = match body {
        Some(body) => body.invoke(&mut validator.writer(&mut buffer), host),
        None => Ok(()),
    };
    let finished = validator.validate(content_type.trim_buffer(), &mut buffer);
    result?;
    finished?;
    buffer.flush()?;
    let captured = buffer.close()?;
    debug!(content_type = %content_type, len = captured.len(), "captured body");
    Ok(captured)
}

/// Run a discarding producer's body under the discard context.
fn discard<'b>(body: Option<&mut (dyn Body + 'b)>, host: &mut dyn EncodingHost) -> Result<()> {
    let Some(body) = body else {
        return Ok(());
    };
    let prior = context::enter(host, RequestContext::DISCARD);
    let result = body.invoke(&mut NullSink, host);
    context::exit(host, prior);
    result
}

fn invalid_return(phase: LifecyclePhase, control: BodyControl) -> PipelineError {
    PipelineError::InvalidLifecycleReturn { phase, control }
}
