//! Integration tests for response encoding.

use commonware_binding::{
    Attribute, Binding, EncodeError, Error, Errors, HeaderBinding, JsonCodec, Method,
    PayloadShape, Request, ResponseBody, ResponseSpec, ServiceError, Value,
};
use http::StatusCode;

fn create() -> Method {
    Method::new("create")
        .response(
            ResponseSpec::new(StatusCode::CREATED)
                .tagged("outcome", "created")
                .header(HeaderBinding::new("id", Attribute::uint64()).wire_name("Location"))
                .body(ResponseBody::Fields(vec!["id".into()])),
        )
        .response(
            ResponseSpec::new(StatusCode::ACCEPTED)
                .tagged("outcome", "accepted")
                .header(
                    HeaderBinding::new("retry", Attribute::uint32().default_value(30))
                        .wire_name("Retry-After"),
                ),
        )
        .response(ResponseSpec::new(StatusCode::OK).body(ResponseBody::Result))
}

#[test]
fn test_tag_dispatch() {
    let method = create();
    let codec = JsonCodec::default();
    let request = Request::default();

    let result = Value::object([("outcome", Value::from("created")), ("id", Value::UInt(9))]);
    let response = method.encode_response(&request, &result, &codec).unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.header("location"), Some("9"));
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(&response.body[..], br#"{"id":9}"#);

    let result = Value::object([("outcome", "accepted")]);
    let response = method.encode_response(&request, &result, &codec).unwrap();
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.header("retry-after"), Some("30"));
    assert!(response.body.is_empty());

    let result = Value::object([("outcome", "done")]);
    let response = method.encode_response(&request, &result, &codec).unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("location"), None);
    assert_eq!(&response.body[..], br#"{"outcome":"done"}"#);

    let response = method
        .encode_response(&request, &Value::object([("id", 1)]), &codec)
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
}

#[test]
fn test_first_declared_tag_wins() {
    let method = Method::new("create")
        .response(ResponseSpec::new(StatusCode::CREATED).tagged("outcome", "created"))
        .response(ResponseSpec::new(StatusCode::ACCEPTED).tagged("state", "queued"))
        .response(ResponseSpec::new(StatusCode::OK));
    let codec = JsonCodec::default();
    let result = Value::object([("outcome", "created"), ("state", "queued")]);
    let response = method
        .encode_response(&Request::default(), &result, &codec)
        .unwrap();
    assert_eq!(response.status, StatusCode::CREATED);

    // Declaring the other response first flips the choice
    let method = Method::new("create")
        .response(ResponseSpec::new(StatusCode::ACCEPTED).tagged("state", "queued"))
        .response(ResponseSpec::new(StatusCode::CREATED).tagged("outcome", "created"))
        .response(ResponseSpec::new(StatusCode::OK));
    let response = method
        .encode_response(&Request::default(), &result, &codec)
        .unwrap();
    assert_eq!(response.status, StatusCode::ACCEPTED);
}

#[test]
fn test_integer_header_outside_width_is_invalid() {
    let header = |attribute: Attribute| {
        Method::new("get").response(
            ResponseSpec::new(StatusCode::OK).header(HeaderBinding::new("v", attribute)),
        )
    };
    let codec = JsonCodec::default();
    let cases = [
        (Attribute::uint32(), Value::Int(-1)),
        (Attribute::int32(), Value::Int(1 << 40)),
        (Attribute::float32(), Value::Float(f64::MAX)),
    ];
    for (attribute, value) in cases {
        let err = header(attribute)
            .encode_response(&Request::default(), &Value::object([("v", value)]), &codec)
            .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidResult(_)), "{err}");
    }

    // Values that fit are written and decode back
    let response = header(Attribute::uint32())
        .encode_response(
            &Request::default(),
            &Value::object([("v", Value::Int(5))]),
            &codec,
        )
        .unwrap();
    assert_eq!(response.header("v"), Some("5"));
    let decoder = Method::new("get")
        .payload(PayloadShape::Attribute)
        .bind(Binding::header("v", Attribute::uint32()).unwrap());
    let request = Request::default().with_header("v", "5").unwrap();
    assert_eq!(decoder.decode_request(&request, &codec), Ok(Value::UInt(5)));
}

#[test]
fn test_header_value_overrides_default() {
    let method = create();
    let result = Value::object([("outcome", Value::from("accepted")), ("retry", Value::UInt(5))]);
    let response = method
        .encode_response(&Request::default(), &result, &JsonCodec::default())
        .unwrap();
    assert_eq!(response.header("retry-after"), Some("5"));
}

#[test]
fn test_header_arrays_are_joined() {
    let method = Method::new("list").response(
        ResponseSpec::new(StatusCode::OK).header(
            HeaderBinding::new("links", Attribute::array(Attribute::string())).wire_name("Link"),
        ),
    );
    let result = Value::object([("links", vec!["</a>", "</b>"])]);
    let response = method
        .encode_response(&Request::default(), &result, &JsonCodec::default())
        .unwrap();
    assert_eq!(response.header("link"), Some("</a>, </b>"));
    assert_eq!(response.headers.get_all("link").iter().count(), 1);
}

#[test]
fn test_non_object_result_with_headers() {
    let method = Method::new("get").response(
        ResponseSpec::new(StatusCode::OK).header(HeaderBinding::new("etag", Attribute::string())),
    );
    let err = method
        .encode_response(&Request::default(), &Value::from(3), &JsonCodec::default())
        .unwrap_err();
    assert!(matches!(err, EncodeError::InvalidResult(_)));

    // A bare value never matches a tag, so the headerless default is used
    let response = create()
        .encode_response(&Request::default(), &Value::from(3), &JsonCodec::default())
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"3");
}

#[test]
fn test_into_http() {
    let method = create();
    let result = Value::object([("outcome", Value::from("created")), ("id", Value::UInt(1))]);
    let response = method
        .encode_response(&Request::default(), &result, &JsonCodec::default())
        .unwrap()
        .into_http();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["location"], "1");
    assert_eq!(&response.body()[..], br#"{"id":1}"#);
}

#[test]
fn test_decode_failures_encode_as_service_error() {
    let method = Method::new("get")
        .payload(PayloadShape::Attribute)
        .bind(Binding::query("q", Attribute::string().required()).unwrap())
        .response(ResponseSpec::new(StatusCode::OK));
    let codec = JsonCodec::default();
    let request = Request::default()
        .with_header("Accept", "application/json")
        .unwrap();

    let errors = method.decode_request(&request, &codec).unwrap_err();
    let response = method.encode_error(&request, &errors, &codec).unwrap();
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.header("content-type"), Some("application/json"));

    let body: ServiceError = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body.message, r#""q" is missing from query string"#);
    assert_eq!(body.id.len(), 12);
    assert!(!body.temporary);
    assert!(!body.timeout);

    // Accumulated failures are joined
    let mut errors = Errors::new();
    errors.merge(Error::MissingAttribute {
        context: "body".into(),
        name: "a".into(),
    });
    errors.merge(Error::MissingAttribute {
        context: "body".into(),
        name: "b".into(),
    });
    let response = method.encode_error(&request, &errors, &codec).unwrap();
    let body: ServiceError = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(
        body.message,
        r#""a" is missing from body; "b" is missing from body"#
    );
}
