
    use super::*;
    use chrono::TimeZone;

    const BASE: Duration = Duration::from_millis(100);
    const MAX: Duration = Duration::from_secs(5);

    #[test]
    fn test_exponential_growth() {
        assert_eq!(compute_delay(0, None, BASE, MAX), Duration::from_millis(100));
        assert_eq!(compute_delay(1, None, BASE, MAX), Duration::from_millis(200));
        assert_eq!(compute_delay(2, None, BASE, MAX), Duration::from_millis(400));
        assert_eq!(compute_delay(3, None, BASE, MAX), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_respects_max() {
        assert_eq!(compute_delay(10, None, BASE, MAX), MAX);
        // Huge attempt counts saturate instead of overflowing
        assert_eq!(compute_delay(200, None, BASE, MAX), MAX);
    }

    #[test]
    fn test_monotonic_until_saturation() {
        let mut previous = Duration::ZERO;
        for attempt in 0..64 {
            let delay = compute_delay(attempt, None, BASE, MAX);
            assert!(delay >= previous, "attempt {attempt} decreased");
            assert!(delay <= MAX);
            previous = delay;
        }
        assert_eq!(previous, MAX);
    }

    #[test]
    fn test_zero_base_never_waits() {
        assert_eq!(compute_delay(5, None, Duration::ZERO, MAX), Duration::ZERO);
    }

    #[test]
    fn test_hint_overrides_exponential() {
        assert_eq!(
            compute_delay(0, Some("3"), BASE, MAX),
            Duration::from_secs(3)
        );
        assert_eq!(compute_delay(0, Some("60"), BASE, MAX), MAX);
    }

    #[test]
    fn test_unparseable_hint_falls_back() {
        assert_eq!(
            compute_delay(1, Some("soon"), BASE, MAX),
            Duration::from_millis(200)
        );
        assert_eq!(
            compute_delay(1, Some(""), BASE, MAX),
            Duration::from_millis(200)
        );
        assert_eq!(
            compute_delay(1, Some("-5"), BASE, MAX),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_rate_limited_floor() {
        let policy = BackoffPolicy::new(Duration::ZERO, Duration::from_secs(30));

        // 5000ms hint stays 5000ms
        assert_eq!(
            policy.delay_for(0, Some("5"), true),
            Duration::from_millis(5000)
        );
        // 200ms hint is raised to the floor
        assert_eq!(
            policy.delay_for(0, Some("0.2"), true),
            Duration::from_millis(1000)
        );
        // Without the rate-limit classification there is no floor
        assert_eq!(
            policy.delay_for(0, Some("0.2"), false),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_policy_raises_max_to_base() {
        let policy = BackoffPolicy::new(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(policy.max, Duration::from_secs(2));
        assert_eq!(policy.delay_for(3, None, false), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("NaN"), None);
        assert_eq!(parse_retry_after("abc"), None);
    }

    #[test]
    fn test_parse_retry_after_http_date() {
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 27, 30).unwrap();
        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_parse_retry_after_past_date_is_zero() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            parse_retry_after_at("Wed, 21 Oct 2015 07:28:00 GMT", now),
            Some(Duration::ZERO)
        );
    }
