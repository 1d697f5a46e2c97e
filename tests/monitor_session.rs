//! Mounted-session behaviour driven through a simulated paint loop.

use std::cell::RefCell;
use std::rc::Rc;

use studyhall::prelude::*;

fn paint(host: &SimulatedHost, from_ms: f64, frames: u32, per_frame_ms: f64) -> f64 {
    let mut t = from_ms;
    for _ in 0..frames {
        t += per_frame_ms;
        assert!(host.fire(t), "session should always have a frame parked");
    }
    t
}

#[test]
fn start_schedules_exactly_one_frame() {
    let host = Rc::new(SimulatedHost::new(0.0));
    let session = MonitorSession::start(Rc::clone(&host), FrameSampler::new(&MonitorConfig::default()));
    assert!(session.is_running());
    assert_eq!(host.requests(), 1);
    assert!(host.has_pending());
}

#[test]
fn every_paint_reschedules() {
    let host = Rc::new(SimulatedHost::new(0.0));
    let session = MonitorSession::start(Rc::clone(&host), FrameSampler::new(&MonitorConfig::default()));
    paint(&host, 0.0, 30, 10.0);
    assert_eq!(session.frames_seen(), 30);
    assert_eq!(host.requests(), 31);
    // 300 ms in: no flush yet.
    assert!(session.last_sample().is_none());
}

#[test]
fn stop_mid_window_cancels_once_and_silences_the_sampler() {
    let samples = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&samples);
    let bus = QualityBus::new();
    let listener = QualityListener::attach(&bus, QualityLevel::High);
    let sampler = FrameSampler::new(&MonitorConfig::default())
        .with_bus(bus.clone())
        .on_sample(move |_| *sink.borrow_mut() += 1);

    let host = Rc::new(SimulatedHost::new(0.0));
    let session = MonitorSession::start(Rc::clone(&host), sampler);
    paint(&host, 0.0, 15, 60.0); // 900 ms of 16 fps, window still open

    session.stop();
    let requests_at_stop = host.requests();
    assert_eq!(host.cancels(), 1);
    assert!(!host.has_pending());

    // Further paints and a second stop do nothing.
    assert!(!host.fire(5_000.0));
    session.stop();
    drop(session);
    assert_eq!(host.requests(), requests_at_stop);
    assert_eq!(host.cancels(), 1);
    assert_eq!(*samples.borrow(), 0);
    assert_eq!(listener.level(), QualityLevel::High);
}

#[test]
fn dropping_the_session_stops_it() {
    let host = Rc::new(SimulatedHost::new(0.0));
    {
        let _session =
            MonitorSession::start(Rc::clone(&host), FrameSampler::new(&MonitorConfig::default()));
        paint(&host, 0.0, 3, 16.0);
    }
    assert_eq!(host.cancels(), 1);
    assert!(!host.has_pending());
}

#[test]
fn hidden_overlay_still_samples() {
    let cfg = MonitorConfig {
        show_debug: false,
        ..MonitorConfig::default()
    };
    let host = Rc::new(SimulatedHost::new(0.0));
    let session = MonitorSession::start(Rc::clone(&host), FrameSampler::new(&cfg));
    paint(&host, 0.0, 60, 1000.0 / 60.0 + 0.01);

    let snap = SessionAdapter::new(&session).snapshot();
    assert!(overlay_lines(&snap, cfg.show_debug).is_empty());
    assert!(host.requests() > 1);
    assert!(snap.last_sample.is_some());
    assert!(!overlay_lines(&snap, true).is_empty());
}

#[test]
fn rolling_average_over_many_windows() {
    let host = Rc::new(SimulatedHost::new(0.0));
    let session = MonitorSession::start(Rc::clone(&host), FrameSampler::new(&MonitorConfig::default()));

    // 12 windows; window k has 10*k frames spread over exactly 1000 ms.
    let mut start = 0.0;
    for k in 1..=12u32 {
        let frames = 10 * k;
        for i in 1..=frames {
            host.fire(start + 1000.0 * f64::from(i) / f64::from(frames));
        }
        start += 1000.0;
    }

    let sample = session.last_sample().unwrap();
    assert_eq!(sample.frame_rate, 120);
    // mean of 30..=120 step 10
    assert_eq!(sample.average_frame_rate, 75.0);
    let snap = SessionAdapter::new(&session).snapshot();
    assert_eq!(snap.history.len(), 10);
    assert_eq!(snap.history.first(), Some(&30));
}

#[test]
fn observer_may_stop_the_session_from_inside_a_flush() {
    let host = Rc::new(SimulatedHost::new(0.0));
    let slot: Rc<RefCell<Option<Rc<MonitorSession<SimulatedHost>>>>> = Rc::new(RefCell::new(None));
    let inner = Rc::clone(&slot);
    let sampler = FrameSampler::new(&MonitorConfig::default()).on_sample(move |_| {
        if let Some(s) = inner.borrow().as_ref() {
            s.stop();
        }
    });
    let session = Rc::new(MonitorSession::start(Rc::clone(&host), sampler));
    *slot.borrow_mut() = Some(Rc::clone(&session));

    for i in 1..=10 {
        host.fire(f64::from(i) * 100.0);
    }
    assert!(!session.is_running());
    assert!(!host.has_pending());
    assert_eq!(session.frames_seen(), 10);
    // Nothing was parked when the observer stopped the session, so nothing
    // is cancelled and no further frame is requested.
    assert_eq!(host.cancels(), 0);
    assert_eq!(host.requests(), 10);
    assert!(!host.fire(2_000.0));
    assert_eq!(host.requests(), 10);
    slot.borrow_mut().take();
}

#[test]
fn stopping_inside_a_flush_suppresses_that_flush_signal() {
    let host = Rc::new(SimulatedHost::new(0.0));
    let bus = QualityBus::new();
    let listener = QualityListener::attach(&bus, QualityLevel::High);
    let slot: Rc<RefCell<Option<Rc<MonitorSession<SimulatedHost>>>>> = Rc::new(RefCell::new(None));
    let inner = Rc::clone(&slot);
    let sampler = FrameSampler::new(&MonitorConfig::default())
        .with_bus(bus.clone())
        .on_sample(move |_| {
            if let Some(s) = inner.borrow().as_ref() {
                s.stop();
            }
        });
    let session = Rc::new(MonitorSession::start(Rc::clone(&host), sampler));
    *slot.borrow_mut() = Some(Rc::clone(&session));

    // 10 fps: a poor window, which would otherwise reduce quality.
    for i in 1..=10 {
        host.fire(f64::from(i) * 100.0);
    }
    assert!(!session.is_running());
    assert_eq!(listener.level(), QualityLevel::High);
    slot.borrow_mut().take();
}

#[test]
fn observer_can_read_the_session_during_a_flush() {
    let host = Rc::new(SimulatedHost::new(0.0));
    let slot: Rc<RefCell<Option<Rc<MonitorSession<SimulatedHost>>>>> = Rc::new(RefCell::new(None));
    let seen: Rc<RefCell<Vec<MonitorSnapshot>>> = Rc::new(RefCell::new(Vec::new()));

    let inner = Rc::clone(&slot);
    let sink = Rc::clone(&seen);
    let sampler = FrameSampler::new(&MonitorConfig::default()).on_sample(move |sample| {
        if let Some(s) = inner.borrow().as_ref() {
            assert_eq!(s.last_sample().as_ref(), Some(sample));
            sink.borrow_mut().push(SessionAdapter::new(s).snapshot());
        }
    });
    let session = Rc::new(MonitorSession::start(Rc::clone(&host), sampler));
    *slot.borrow_mut() = Some(Rc::clone(&session));

    paint(&host, 0.0, 20, 50.0);
    paint(&host, 1000.0, 40, 25.0);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].history, vec![20]);
    assert_eq!(seen[1].history, vec![20, 40]);
    assert!(seen[1].running);
    assert!(session.is_running());
    slot.borrow_mut().take();
}
