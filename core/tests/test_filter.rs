#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use gunzip_core::buffer::Buffer;
    use gunzip_core::config::{BufferBudget, GunzipConfig};
    use gunzip_core::filter::{wants_decompression, GunzipFilter};
    use gunzip_core::pump::{Advance, Blocked, Direction, PumpState, Scope, VecSink};
    use gunzip_core::types::GunzipError;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn both_enabled() -> GunzipConfig {
        GunzipConfig::new(true, BufferBudget::new(4, 64), true)
    }

    // ------------------------------------------------------------
    // Header detection
    // ------------------------------------------------------------

    #[test]
    fn gzip_coding_matches_case_insensitively() {
        let config = both_enabled();
        for (name, value) in [
            ("Content-Encoding", "gzip"),
            ("content-encoding", "GZIP"),
            ("CONTENT-ENCODING", "GZip"),
        ] {
            assert!(wants_decompression(&config, Direction::ResponseBody, [(name, value)]));
        }
    }

    #[test]
    fn other_codings_do_not_match() {
        let config = both_enabled();
        for value in ["br", "x-gzip", "gzip, br", " gzip", "gzip2", ""] {
            assert!(
                !wants_decompression(&config, Direction::ResponseBody, [("Content-Encoding", value)]),
                "{value:?}"
            );
        }
        let no_header: [(&str, &str); 1] = [("Content-Type", "text/plain")];
        assert!(!wants_decompression(&config, Direction::ResponseBody, no_header));
    }

    #[test]
    fn each_direction_has_its_own_switch() {
        let headers = [("Content-Encoding", "gzip")];

        let responses_only = GunzipConfig::new(true, BufferBudget::default(), false);
        assert!(wants_decompression(&responses_only, Direction::ResponseBody, headers));
        assert!(!wants_decompression(&responses_only, Direction::RequestBody, headers));

        let requests_only = GunzipConfig::request_body(BufferBudget::default());
        assert!(!wants_decompression(&requests_only, Direction::ResponseBody, headers));
        assert!(wants_decompression(&requests_only, Direction::RequestBody, headers));
    }

    #[test]
    fn owned_header_pairs_work() {
        let headers = vec![(String::from("Content-Encoding"), String::from("gzip"))];
        assert!(wants_decompression(&both_enabled(), Direction::RequestBody, headers));
    }

    // ------------------------------------------------------------
    // Filter lifecycle
    // ------------------------------------------------------------

    #[test]
    fn for_headers_skips_plain_bodies() {
        let filter = GunzipFilter::for_headers(
            &both_enabled(),
            Direction::ResponseBody,
            [("Content-Encoding", "identity")],
            VecSink::default(),
        )
        .unwrap();
        assert!(filter.is_none());
    }

    #[test]
    fn request_body_is_decompressed_and_length_reported() {
        let body = b"field=value&other=thing".repeat(50);
        let gz = gzip(&body);

        let mut filter = GunzipFilter::for_headers(
            &both_enabled(),
            Direction::RequestBody,
            [("Content-Encoding", "gzip")],
            VecSink::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(filter.state(), PumpState::Idle);

        let (head, tail) = gz.split_at(gz.len() / 2);
        let r = filter.on_chunk([Buffer::from_bytes(head.to_vec())]).unwrap();
        assert_eq!(r, Advance::AgainLater(Blocked::Input));
        assert_eq!(filter.content_length(), None);

        let r = filter.on_chunk([Buffer::last(tail.to_vec())]).unwrap();
        assert_eq!(r, Advance::Finished);
        assert_eq!(filter.content_length(), Some(body.len() as u64));
        assert_eq!(filter.pump().direction(), Direction::RequestBody);

        let snapshot = filter.snapshot();
        assert_eq!(snapshot.bytes_decompressed, body.len() as u64);
        assert_eq!(snapshot.bytes_compressed, gz.len() as u64);

        let sink = filter.into_sink();
        assert_eq!(sink.data, body);
        assert_eq!(sink.finals, 1);
    }

    #[test]
    fn subrequest_filter_never_marks_body_final() {
        let mut filter = GunzipFilter::new(&both_enabled(), Direction::ResponseBody, VecSink::default())
            .unwrap()
            .with_scope(Scope::Subrequest);

        filter.on_chunk([Buffer::last(gzip(b"included"))]).unwrap();
        assert_eq!(filter.sink().data, b"included");
        assert_eq!(filter.sink().finals, 0);
    }

    #[test]
    fn invalid_budget_is_rejected_up_front() {
        let config = GunzipConfig::new(true, BufferBudget::new(0, 4096), false);
        let err = GunzipFilter::new(&config, Direction::ResponseBody, VecSink::default()).err().unwrap();
        assert!(matches!(err, GunzipError::Config(_)));
    }

    #[test]
    fn sink_can_be_borrowed() {
        let mut sink = VecSink::default();
        {
            let mut filter = GunzipFilter::new(&both_enabled(), Direction::ResponseBody, &mut sink).unwrap();
            filter.on_chunk([Buffer::last(gzip(b"borrowed"))]).unwrap();
        }
        assert_eq!(sink.data, b"borrowed");
    }
}
