/// Sanitises a rich-text post body before it is stored.
///
/// Whitelist-based: formatting tags such as <p>, <b> and <a> survive while
/// <script>, <iframe> and event-handler attributes are stripped.
pub fn sanitize_post_body(input: &str) -> String {
    ammonia::clean(input)
}

