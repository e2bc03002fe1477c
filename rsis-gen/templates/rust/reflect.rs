unsafe fn rsis_reflect_{{snake}}(
    ctx: *mut c_void,
    on_class: RsisClassCallback,
    on_member: RsisMemberCallback,
) {
    on_class(ctx, c"{{name}}".as_ptr(), size_of::<{{name}}>());
{{members}}
}
